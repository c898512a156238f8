// Keypair Tests
// Key generation, restoration and the addresses derived from keys

use fundme::identity::{Keypair, KeypairError, PublicKey};

/// Test: Each generated keypair should be unique
#[test]
fn test_keypairs_are_unique() {
    let keypair1 = Keypair::generate();
    let keypair2 = Keypair::generate();

    assert_ne!(
        keypair1.public_key().as_bytes(),
        keypair2.public_key().as_bytes(),
        "Two generated keypairs should have different public keys"
    );
    assert_ne!(keypair1.address(), keypair2.address());
}

/// Test: Can serialize keypair to bytes and restore it
#[test]
fn test_keypair_serialization() {
    let original = Keypair::generate();
    let bytes = original.to_bytes();

    let restored = Keypair::from_bytes(&bytes).expect("Should deserialize keypair from bytes");

    assert_eq!(original.public_key(), restored.public_key());
    assert_eq!(original.address(), restored.address());
}

/// Test: Restoring from the wrong number of bytes fails
#[test]
fn test_keypair_from_short_bytes_fails() {
    let result = Keypair::from_bytes(&[7u8; 16]);

    assert!(matches!(
        result,
        Err(KeypairError::InvalidLength { expected: 32, got: 16 })
    ));
}

/// Test: Public key bytes round back to the same address
#[test]
fn test_public_key_from_bytes_keeps_address() {
    let keypair = Keypair::generate();
    let public_key = PublicKey::from_bytes(keypair.public_key().as_bytes()).unwrap();

    assert_eq!(public_key.address(), keypair.address());
}

/// Test: Address derivation is deterministic
#[test]
fn test_address_is_deterministic() {
    let keypair = Keypair::from_bytes(&[1u8; 32]).unwrap();
    let again = Keypair::from_bytes(&[1u8; 32]).unwrap();

    assert_eq!(keypair.address(), again.address());
    assert!(!keypair.address().is_zero());
}
