// Account Book Tests
// External balances, nonces and transfer refusal

use fundme::identity::{Address, Keypair};
use fundme::ledger::{TransferError, ValueTransfer};
use fundme::runtime::{AccountBook, AccountError};
use fundme::units::WEI_PER_ETHER;

#[test]
fn test_mint_and_debit() {
    let mut book = AccountBook::new();
    let alice = Keypair::generate().address();

    book.mint(alice, 5 * WEI_PER_ETHER).unwrap();
    book.debit(&alice, 2 * WEI_PER_ETHER).unwrap();

    assert_eq!(book.balance(&alice), 3 * WEI_PER_ETHER);
    assert_eq!(book.total(), 3 * WEI_PER_ETHER);
}

#[test]
fn test_debit_beyond_balance_fails() {
    let mut book = AccountBook::new();
    let alice = Keypair::generate().address();
    book.mint(alice, 10).unwrap();

    let result = book.debit(&alice, 11);

    assert_eq!(
        result,
        Err(AccountError::InsufficientFunds {
            available: 10,
            required: 11
        })
    );
    assert_eq!(book.balance(&alice), 10);
}

#[test]
fn test_mint_overflow() {
    let mut book = AccountBook::new();
    let alice = Keypair::generate().address();
    book.mint(alice, u128::MAX).unwrap();

    assert_eq!(book.mint(alice, 1), Err(AccountError::Overflow));
}

#[test]
fn test_nonces_advance() {
    let mut book = AccountBook::new();
    let alice = Keypair::generate().address();

    assert_eq!(book.next_nonce(&alice), 0);
    assert_eq!(book.next_nonce(&alice), 1);
    assert_eq!(book.nonce(&alice), 2);

    book.set_nonce(alice, 7);
    assert_eq!(book.nonce(&alice), 7);

    // never moves backwards
    book.set_nonce(alice, 3);
    assert_eq!(book.nonce(&alice), 7);
}

#[test]
fn test_transfer_credits_recipient() {
    let mut book = AccountBook::new();
    let owner = Keypair::generate().address();

    book.transfer(&owner, WEI_PER_ETHER).unwrap();

    assert_eq!(book.balance(&owner), WEI_PER_ETHER);
}

#[test]
fn test_rejecting_account_refuses_transfer() {
    let mut book = AccountBook::new();
    let owner = Address::from_bytes([7; 20]);
    book.set_rejecting(owner, true);

    assert!(book.is_rejecting(&owner));
    assert_eq!(
        book.transfer(&owner, WEI_PER_ETHER),
        Err(TransferError::Rejected(owner))
    );
    assert_eq!(book.balance(&owner), 0);

    book.set_rejecting(owner, false);
    book.transfer(&owner, WEI_PER_ETHER).unwrap();
    assert_eq!(book.balance(&owner), WEI_PER_ETHER);
}

#[test]
fn test_transfer_overflow() {
    let mut book = AccountBook::new();
    let owner = Keypair::generate().address();
    book.mint(owner, u128::MAX).unwrap();

    assert_eq!(book.transfer(&owner, 1), Err(TransferError::Overflow));
}

#[test]
fn test_accounts_skip_empty_balances() {
    let mut book = AccountBook::new();
    let alice = Keypair::generate().address();
    let bob = Keypair::generate().address();
    book.mint(alice, 1).unwrap();
    book.mint(bob, 1).unwrap();
    book.debit(&bob, 1).unwrap();

    let listed: Vec<_> = book.accounts().map(|(a, _)| *a).collect();

    assert_eq!(listed, vec![alice]);
}

// ============================================================================
// CHECKPOINTS
// ============================================================================

#[test]
fn test_restore_puts_back_captured_accounts_only() {
    let mut book = AccountBook::new();
    let alice = Keypair::generate().address();
    let bob = Keypair::generate().address();
    let carol = Keypair::generate().address();
    book.mint(alice, 10).unwrap();
    book.mint(carol, 10).unwrap();

    let checkpoint = book.checkpoint(&[alice, bob]);
    book.debit(&alice, 4).unwrap();
    book.next_nonce(&alice);
    book.transfer(&bob, 7).unwrap();
    book.debit(&carol, 3).unwrap();
    book.restore(checkpoint);

    assert_eq!(book.balance(&alice), 10);
    assert_eq!(book.nonce(&alice), 0);
    assert_eq!(book.balance(&bob), 0);
    // carol was not captured
    assert_eq!(book.balance(&carol), 7);
}

#[test]
fn test_restore_with_repeated_account() {
    let mut book = AccountBook::new();
    let owner = Keypair::generate().address();
    book.mint(owner, 10).unwrap();

    let checkpoint = book.checkpoint(&[owner, owner]);
    book.debit(&owner, 10).unwrap();
    book.restore(checkpoint);

    assert_eq!(book.balance(&owner), 10);
}

#[test]
fn test_refund_credits_and_saturates() {
    let mut book = AccountBook::new();
    let alice = Keypair::generate().address();

    book.refund(&alice, 5);
    assert_eq!(book.balance(&alice), 5);

    book.refund(&alice, u128::MAX);
    assert_eq!(book.balance(&alice), u128::MAX);
}
