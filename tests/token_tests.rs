use inkpost::auth::{Claims, TokenError, TokenService};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

const TEST_SECRET: &str = "token-test-secret-0987654321";
const TTL: Duration = Duration::from_secs(60 * 60);

fn service() -> TokenService {
    TokenService::new(TEST_SECRET, TTL)
}

/// Hand-encodes a token with explicit timestamps, so tests can place the expiry
/// in the past without waiting for real time to elapse.
fn encode_with_offsets(secret: &str, sub: Uuid, iat_offset: i64, exp_offset: i64) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub,
        iat: (now + iat_offset) as usize,
        exp: (now + exp_offset) as usize,
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

// --- Token Service Properties ---

#[test]
fn test_issue_then_verify_returns_subject() {
    let tokens = service();
    let subject = Uuid::new_v4();

    let token = tokens.issue(subject).unwrap();
    assert_eq!(tokens.verify(&token), Ok(subject));
}

#[test]
fn test_expired_token_is_rejected() {
    let tokens = service();
    let subject = Uuid::new_v4();

    // Issued an hour ago, expired a minute ago.
    let token = encode_with_offsets(TEST_SECRET, subject, -3600, -60);
    assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
}

#[test]
fn test_tampered_signature_is_rejected() {
    let tokens = service();
    let token = tokens.issue(Uuid::new_v4()).unwrap();

    // Flip the first character of the signature segment.
    let (head, signature) = token.rsplit_once('.').unwrap();
    let mut chars: Vec<char> = signature.chars().collect();
    chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
    let forged: String = chars.into_iter().collect();
    let tampered = format!("{}.{}", head, forged);

    assert_eq!(tokens.verify(&tampered), Err(TokenError::BadSignature));
}

#[test]
fn test_tampered_claims_fail_before_interpretation() {
    let tokens = service();
    let token = tokens.issue(Uuid::new_v4()).unwrap();

    // Altering the payload invalidates the MAC. The reject happens at the
    // signature check, before the mangled claims are ever parsed.
    let parts: Vec<&str> = token.split('.').collect();
    let mut payload: Vec<char> = parts[1].chars().collect();
    payload[0] = if payload[0] == 'A' { 'B' } else { 'A' };
    let forged_payload: String = payload.into_iter().collect();
    let tampered = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

    assert_eq!(tokens.verify(&tampered), Err(TokenError::BadSignature));
}

#[test]
fn test_other_secret_fails_verification() {
    let issuer = TokenService::new("secret-one", TTL);
    let verifier = TokenService::new("secret-two", TTL);

    let token = issuer.issue(Uuid::new_v4()).unwrap();
    assert_eq!(verifier.verify(&token), Err(TokenError::BadSignature));
}

#[test]
fn test_garbage_is_malformed() {
    let tokens = service();

    assert_eq!(tokens.verify("not-a-jwt"), Err(TokenError::Malformed));
    assert_eq!(tokens.verify(""), Err(TokenError::Malformed));
    assert_eq!(
        tokens.verify("only.two-segments"),
        Err(TokenError::Malformed)
    );
}

#[test]
fn test_issued_claims_carry_the_configured_ttl() {
    let short = TokenService::new(TEST_SECRET, Duration::from_secs(10));
    let subject = Uuid::new_v4();

    // Still inside the 10-second window.
    let token = short.issue(subject).unwrap();
    assert_eq!(short.verify(&token), Ok(subject));

    // The same claims shape with the window already behind us must be rejected.
    let stale = encode_with_offsets(TEST_SECRET, subject, -20, -10);
    assert_eq!(short.verify(&stale), Err(TokenError::Expired));
}
