//! # Sealing, Signing, and Verification
//!
//! The crypto service of the ledger core. It operates over two capability
//! contracts: [`Record`] (anything the envelope codec can encode, and thus
//! anything that can carry a content hash) and [`Signable`] (records that
//! additionally carry a sender address, a public key, and a signature).
//!
//! ## Two digests, not one
//!
//! Signing and verification hash the record's *signable* encoding: the
//! envelope bytes with the signature field blank and the public key present.
//! The record's stored content hash, by contrast, is the digest of the
//! *fully-signed* encoding. These are two distinct digests over two distinct
//! byte strings; conflating them breaks either replay detection or content
//! addressing, depending on which way you get it wrong.

use crate::codec::{self, Record};
use crate::crypto::address::Address;
use crate::crypto::hash::Hash;
use crate::crypto::keys::{Keypair, PublicKey, Signature};
use crate::error::{CoreError, CoreResult};

/// A record that can be signed by an account key.
///
/// `signable_bytes` must return the record's envelope encoding with the
/// signature blank; everything else, the public key included, is covered
/// by the signature.
pub trait Signable: Record {
    /// The declared sender account.
    fn sender(&self) -> &Address;

    /// The embedded public key (empty before signing).
    fn public_key(&self) -> &PublicKey;

    /// Write the signer's public key onto the record.
    fn set_public_key(&mut self, pk: PublicKey);

    /// The embedded signature (empty before signing).
    fn signature(&self) -> &Signature;

    /// Write the signature onto the record.
    fn set_signature(&mut self, sig: Signature);

    /// The envelope encoding with the signature field blank.
    fn signable_bytes(&self) -> CoreResult<Vec<u8>>;
}

/// Encode a record, compute its content hash, and write the hash back.
///
/// Returns both the hash and the encoded bytes, which is exactly what a trie put
/// needs as (key, value).
pub fn seal<R: Record>(record: &mut R) -> CoreResult<(Hash, Vec<u8>)> {
    let bytes = codec::encode(record)?;
    let hash = Hash::of(&bytes);
    record.set_hash(hash);
    Ok((hash, bytes))
}

/// Sign a record in place with the given keypair.
///
/// The procedure, in order:
/// 1. Write the signer's public key onto the record.
/// 2. Hash the signable encoding (signature blank at this point).
/// 3. Sign that digest and write the signature onto the record.
/// 4. Re-seal: the stored content hash covers the now-complete encoding.
pub fn sign<S: Signable>(keypair: &Keypair, record: &mut S) -> CoreResult<()> {
    record.set_public_key(keypair.public_key());
    record.set_signature(Signature::empty());

    let signable = record.signable_bytes()?;
    let digest = Hash::of(&signable);
    record.set_signature(keypair.sign(digest.as_bytes()));

    seal(record)?;
    Ok(())
}

/// Verify a signed record.
///
/// Checks that the embedded public key derives the declared sender address
/// (`AddressMismatch` otherwise; a valid signature from the wrong key must
/// not pass), then that the embedded signature verifies over the digest of
/// the signable encoding (`BadSignature` otherwise).
pub fn verify<S: Signable>(record: &S) -> CoreResult<()> {
    let pk = record.public_key();
    pk.to_verifying_key().map_err(|_| CoreError::BadSignature)?;

    let derived = Address::from_public_key(pk);
    if derived != *record.sender() {
        return Err(CoreError::AddressMismatch);
    }

    let signable = record.signable_bytes()?;
    let digest = Hash::of(&signable);
    if !pk.verify(digest.as_bytes(), record.signature()) {
        return Err(CoreError::BadSignature);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::transaction::Transaction;

    fn signed_transaction() -> (Transaction, Keypair) {
        let kp = Keypair::generate();
        let destination = Address::from_public_key(&Keypair::generate().public_key());
        let mut tx = Transaction::new(
            Address::from_public_key(&kp.public_key()),
            1,
            100,
            10,
            destination,
            vec![1, 2, 3, 4],
        );
        sign(&kp, &mut tx).unwrap();
        (tx, kp)
    }

    #[test]
    fn sign_then_verify_succeeds() {
        let (tx, _) = signed_transaction();
        assert!(verify(&tx).is_ok());
        assert!(!tx.hash.is_zero());
        assert!(!tx.signature.is_empty());
        assert!(!tx.public_key.is_empty());
    }

    #[test]
    fn content_hash_differs_from_signable_digest() {
        let (tx, _) = signed_transaction();
        let signable_digest = Hash::of(&tx.signable_bytes().unwrap());
        assert_ne!(tx.hash, signable_digest);
    }

    #[test]
    fn tampered_amount_fails_verification() {
        let (mut tx, _) = signed_transaction();
        tx.amount += 1;
        assert!(matches!(verify(&tx), Err(CoreError::BadSignature)));
    }

    #[test]
    fn tampered_sequence_fails_verification() {
        let (mut tx, _) = signed_transaction();
        tx.sequence += 1;
        assert!(matches!(verify(&tx), Err(CoreError::BadSignature)));
    }

    #[test]
    fn tampered_destination_fails_verification() {
        let (mut tx, _) = signed_transaction();
        tx.destination = Address::from_bytes([0xAB; 32]);
        assert!(matches!(verify(&tx), Err(CoreError::BadSignature)));
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let (mut tx, _) = signed_transaction();
        tx.payload.push(0xFF);
        assert!(matches!(verify(&tx), Err(CoreError::BadSignature)));
    }

    #[test]
    fn substituted_key_fails_with_address_mismatch() {
        let (mut tx, _) = signed_transaction();
        // A valid key that does not derive the declared sender.
        tx.public_key = Keypair::generate().public_key();
        assert!(matches!(verify(&tx), Err(CoreError::AddressMismatch)));
    }

    #[test]
    fn unsigned_record_fails_verification() {
        let kp = Keypair::generate();
        let tx = Transaction::new(
            Address::from_public_key(&kp.public_key()),
            1,
            100,
            10,
            Address::from_bytes([2u8; 32]),
            Vec::new(),
        );
        // Empty public key is unusable.
        assert!(matches!(verify(&tx), Err(CoreError::BadSignature)));
    }

    #[test]
    fn seal_writes_hash_of_tagged_encoding() {
        let (mut tx, _) = signed_transaction();
        let (hash, bytes) = seal(&mut tx).unwrap();
        assert_eq!(hash, Hash::of(&bytes));
        assert_eq!(tx.hash, hash);
        assert_eq!(bytes[0], crate::codec::RecordKind::Transaction.tag());
    }
}
