use super::*;

#[test]
fn plain_names_are_local_usernames() {
    for raw in ["johndoe", "john.doe", "j_d-1", "Ωmega"] {
        assert_eq!(
            classify(raw),
            Ok(Identifier::LocalUsername(raw.to_string())),
            "input {raw:?}"
        );
    }
}

#[test]
fn surrounding_whitespace_is_trimmed() {
    assert_eq!(
        classify("  johndoe\t"),
        Ok(Identifier::LocalUsername("johndoe".to_string()))
    );
}

#[test]
fn empty_and_blank_input_is_rejected() {
    assert_eq!(classify(""), Err(IdentifierError::Empty));
    assert_eq!(classify("   "), Err(IdentifierError::Empty));
}

#[test]
fn well_formed_account_id_is_split_into_parts() {
    assert_eq!(
        classify("@user:server"),
        Ok(Identifier::QualifiedAccountId {
            local_part: "user".to_string(),
            server: "server".to_string(),
        })
    );
}

#[test]
fn account_id_server_keeps_its_port() {
    assert_eq!(
        classify("@jane:example.org:8448"),
        Ok(Identifier::QualifiedAccountId {
            local_part: "jane".to_string(),
            server: "example.org:8448".to_string(),
        })
    );
}

#[test]
fn malformed_account_ids_do_not_fall_back_to_usernames() {
    let cases = [
        ("@:server", MissingPart::LocalPart),
        ("@user:", MissingPart::Server),
        ("@:", MissingPart::LocalPart),
        ("@user", MissingPart::Separator),
        ("@us er:server", MissingPart::LocalPart),
    ];

    for (raw, missing) in cases {
        assert_eq!(
            classify(raw),
            Err(IdentifierError::MalformedAccountId {
                raw: raw.to_string(),
                missing,
            }),
            "input {raw:?}"
        );
    }
}

#[test]
fn email_addresses_are_detected() {
    let identifier = classify("john@example.com").expect("classify");
    assert_eq!(
        identifier,
        Identifier::EmailAddress("john@example.com".to_string())
    );
    assert_eq!(identifier.kind(), IdentifierKind::EmailAddress);
}

#[test]
fn email_look_alikes_without_domain_dot_are_usernames() {
    assert_eq!(
        classify("john@localhost"),
        Ok(Identifier::LocalUsername("john@localhost".to_string()))
    );
}
