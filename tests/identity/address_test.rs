// Address Tests
// Parsing, display and contract address derivation

use fundme::identity::{Address, AddressError, Keypair};

// ============================================================================
// PARSING AND DISPLAY
// ============================================================================

#[test]
fn test_display_is_lowercase_hex_with_prefix() {
    let address = Address::from_bytes([0xAB; 20]);

    assert_eq!(address.to_string(), format!("0x{}", "ab".repeat(20)));
}

#[test]
fn test_parse_round_trips_display() {
    let address = Keypair::generate().address();

    assert_eq!(Address::parse(&address.to_string()).unwrap(), address);
}

#[test]
fn test_parse_accepts_mixed_case() {
    let address: Address = "0x8A753747A1Fa494EC906cE90E9f37563A8AF630e".parse().unwrap();

    assert_eq!(address.as_bytes()[0], 0x8a);
    assert_eq!(address.as_bytes()[19], 0x0e);
}

#[test]
fn test_parse_requires_prefix() {
    let result = Address::parse(&"ab".repeat(20));

    assert_eq!(result, Err(AddressError::MissingPrefix));
}

#[test]
fn test_parse_rejects_wrong_length() {
    let result = Address::parse("0x1234");

    assert_eq!(result, Err(AddressError::InvalidLength { expected: 40, got: 4 }));
}

#[test]
fn test_parse_rejects_non_hex() {
    let result = Address::parse(&format!("0x{}", "zz".repeat(20)));

    assert!(matches!(result, Err(AddressError::InvalidHex(_))));
}

// ============================================================================
// CONTRACT ADDRESSES
// ============================================================================

#[test]
fn test_contract_address_depends_on_nonce() {
    let deployer = Keypair::generate().address();

    assert_ne!(Address::contract(&deployer, 0), Address::contract(&deployer, 1));
    assert_eq!(Address::contract(&deployer, 3), Address::contract(&deployer, 3));
}

#[test]
fn test_contract_address_depends_on_deployer() {
    let a = Keypair::generate().address();
    let b = Keypair::generate().address();

    assert_ne!(Address::contract(&a, 0), Address::contract(&b, 0));
}

#[test]
fn test_zero_address() {
    assert!(Address::ZERO.is_zero());
    assert_eq!(Address::ZERO.to_string(), format!("0x{}", "0".repeat(40)));
}
