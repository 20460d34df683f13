use logbook_api::auth::SessionKeys;
use logbook_api::config::parse_list;
use logbook_cli::commands::token::{mint, TokenArgs};
use logbook_core::models::Role;

const SECRET: &str = "cli-dev-secret";

fn args(issuers: &str) -> TokenArgs {
    TokenArgs {
        user: "user_2f9".to_string(),
        role: Role::Faculty,
        batch: None,
        hours: 1,
        secret: SECRET.to_string(),
        issuers: issuers.to_string(),
    }
}

#[test]
fn test_minted_token_verifies_against_server_issuers() {
    let server_issuers = " residency-logbook , https://clerk.example.org ";
    let token = mint(&args(server_issuers)).unwrap();

    let server = SessionKeys::new(SECRET, &parse_list(server_issuers));
    let claims = server.verify(&token).unwrap();
    assert_eq!(claims.sub, "user_2f9");
    assert_eq!(claims.role, Role::Faculty);
    assert_eq!(claims.iss, "residency-logbook");
}

#[test]
fn test_token_for_other_issuer_is_rejected() {
    let token = mint(&args("staging-logbook")).unwrap();
    let server = SessionKeys::new(SECRET, &["residency-logbook".to_string()]);
    assert!(server.verify(&token).is_err());
}
