//! Note Encryption
//!
//! Encrypts note data for the recipient using ECDH + ChaCha20-Poly1305, and
//! keeps an outgoing copy of the key material readable with the sender's
//! outgoing viewing key.
//!
//! ```text
//! Flow:
//! 1. esk = PRF(rseed, rho), epk = x25519(esk)
//! 2. Shared secret = ECDH(esk, pk_d)
//! 3. Encryption key = KDF(shared_secret, epk)
//! 4. enc_ciphertext = ChaCha20-Poly1305(key, 0, lead || value || rseed || memo)
//! 5. ock = KDF(ovk, cv, cmx, epk)
//! 6. out_ciphertext = ChaCha20-Poly1305(ock, 0, owner || pk_d || esk)
//! ```
//!
//! Every key is used for exactly one message, so a fixed nonce is safe.

use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce,
    aead::{Aead, KeyInit},
};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::commitment::NoteCommitment;
use crate::encoding::{base_from_bytes, base_to_bytes};
use crate::error::PrivacyError;
use crate::keys::{Address, FullViewingKey, OutgoingViewingKey};
use crate::note::{Note, NoteValue, RandomSeed, Rho};
use crate::prf;
use crate::value::ValueCommitment;

pub const MEMO_SIZE: usize = 512;
const NOTE_PLAINTEXT_LEAD_BYTE: u8 = 0x02;
const NOTE_PLAINTEXT_SIZE: usize = 1 + 8 + 32 + MEMO_SIZE;
const OUT_PLAINTEXT_SIZE: usize = 32 + 32 + 32;
const AEAD_TAG_SIZE: usize = 16;

pub const ENC_CIPHERTEXT_SIZE: usize = NOTE_PLAINTEXT_SIZE + AEAD_TAG_SIZE;
pub const OUT_CIPHERTEXT_SIZE: usize = OUT_PLAINTEXT_SIZE + AEAD_TAG_SIZE;

/// Free-form memo attached to an output
pub type Memo = [u8; MEMO_SIZE];

/// The "no memo" marker: 0xF6 followed by zeros.
pub fn empty_memo() -> Memo {
    let mut memo = [0u8; MEMO_SIZE];
    memo[0] = 0xf6;
    memo
}

/// Encrypted note as carried by an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmittedNoteCiphertext {
    /// Ephemeral public key for ECDH
    pub epk_bytes: [u8; 32],
    /// Note plaintext for the recipient
    pub enc_ciphertext: [u8; ENC_CIPHERTEXT_SIZE],
    /// Key material for the sender
    pub out_ciphertext: [u8; OUT_CIPHERTEXT_SIZE],
}

/// Encrypt `note` to its recipient
///
/// `cv` and `cmx` are the action's value commitment and note commitment;
/// they bind the outgoing ciphertext to the action.
pub fn encrypt_note(
    note: &Note,
    memo: &Memo,
    ovk: &OutgoingViewingKey,
    cv: &ValueCommitment,
    cmx: &NoteCommitment,
) -> Result<TransmittedNoteCiphertext, PrivacyError> {
    let esk_bytes = note.rseed().esk(&note.rho());
    let esk = StaticSecret::from(esk_bytes);
    let epk = PublicKey::from(&esk);

    let recipient = note.recipient();
    let pk_d = PublicKey::from(*recipient.transmission_key());
    let shared_secret = esk.diffie_hellman(&pk_d);
    let key = derive_note_key(shared_secret.as_bytes(), epk.as_bytes());

    let plaintext = serialize_plaintext(note.value(), note.rseed(), memo);
    let enc_ciphertext = seal::<ENC_CIPHERTEXT_SIZE>(&key, &plaintext)?;

    let ock = derive_ock(ovk, cv, cmx, epk.as_bytes());
    let mut out_plaintext = [0u8; OUT_PLAINTEXT_SIZE];
    out_plaintext[..32].copy_from_slice(&base_to_bytes(&recipient.owner()));
    out_plaintext[32..64].copy_from_slice(pk_d.as_bytes());
    out_plaintext[64..].copy_from_slice(&esk_bytes);
    let out_ciphertext = seal::<OUT_CIPHERTEXT_SIZE>(&ock, &out_plaintext)?;

    Ok(TransmittedNoteCiphertext {
        epk_bytes: *epk.as_bytes(),
        enc_ciphertext,
        out_ciphertext,
    })
}

/// Try to decrypt a note as its recipient (scan mode)
///
/// `rho` is the action's nullifier. Returns the note only if the plaintext
/// reproduces both the ephemeral key and the published commitment.
pub fn try_note_decryption(
    fvk: &FullViewingKey,
    rho: &Rho,
    cmx: &NoteCommitment,
    ct: &TransmittedNoteCiphertext,
) -> Option<(Note, Memo)> {
    let ivk = fvk.ivk();
    let epk = PublicKey::from(ct.epk_bytes);
    let shared_secret = ivk.secret().diffie_hellman(&epk);
    let key = derive_note_key(shared_secret.as_bytes(), &ct.epk_bytes);

    let plaintext = open(&key, &ct.enc_ciphertext)?;
    let (value, rseed, memo) = deserialize_plaintext(&plaintext)?;

    let note = Note::from_parts(fvk.address(), value, *rho, rseed);
    check_note(&note, &ct.epk_bytes, cmx)?;
    Some((note, memo))
}

/// Recover a sent note with the sender's outgoing viewing key
pub fn recover_with_ovk(
    ovk: &OutgoingViewingKey,
    cv: &ValueCommitment,
    cmx: &NoteCommitment,
    rho: &Rho,
    ct: &TransmittedNoteCiphertext,
) -> Option<(Note, Memo)> {
    let ock = derive_ock(ovk, cv, cmx, &ct.epk_bytes);
    let out_plaintext = open(&ock, &ct.out_ciphertext)?;

    let owner = base_from_bytes(out_plaintext[..32].try_into().ok()?)?;
    let pk_d_bytes: [u8; 32] = out_plaintext[32..64].try_into().ok()?;
    let esk_bytes: [u8; 32] = out_plaintext[64..].try_into().ok()?;

    let esk = StaticSecret::from(esk_bytes);
    let shared_secret = esk.diffie_hellman(&PublicKey::from(pk_d_bytes));
    let key = derive_note_key(shared_secret.as_bytes(), &ct.epk_bytes);

    let plaintext = open(&key, &ct.enc_ciphertext)?;
    let (value, rseed, memo) = deserialize_plaintext(&plaintext)?;

    let recipient = Address::from_parts(owner, pk_d_bytes);
    let note = Note::from_parts(recipient, value, *rho, rseed);
    check_note(&note, &ct.epk_bytes, cmx)?;
    Some((note, memo))
}

fn check_note(note: &Note, epk_bytes: &[u8; 32], cmx: &NoteCommitment) -> Option<()> {
    let esk = StaticSecret::from(note.rseed().esk(&note.rho()));
    if PublicKey::from(&esk).as_bytes() != epk_bytes {
        return None;
    }
    (note.commitment() == *cmx).then_some(())
}

/// Derive encryption key from shared secret
fn derive_note_key(shared_secret: &[u8; 32], epk: &[u8; 32]) -> [u8; 32] {
    prf::derive_key(prf::NOTE_KEY_DOMAIN, &[shared_secret, epk])
}

fn derive_ock(
    ovk: &OutgoingViewingKey,
    cv: &ValueCommitment,
    cmx: &NoteCommitment,
    epk: &[u8; 32],
) -> [u8; 32] {
    prf::derive_key(
        prf::OCK_DOMAIN,
        &[ovk.as_bytes(), &cv.to_bytes(), &cmx.to_bytes(), epk],
    )
}

fn seal<const N: usize>(key: &[u8; 32], plaintext: &[u8]) -> Result<[u8; N], PrivacyError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&[0u8; 12]), plaintext)
        .map_err(|_| PrivacyError::Encryption)?;
    let got = ciphertext.len();
    ciphertext
        .try_into()
        .map_err(|_| PrivacyError::CiphertextLength { expected: N, got })
}

fn open(key: &[u8; 32], ciphertext: &[u8]) -> Option<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(&[0u8; 12]), ciphertext)
        .ok()
}

/// Serialize plaintext for encryption
fn serialize_plaintext(value: NoteValue, rseed: &RandomSeed, memo: &Memo) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(NOTE_PLAINTEXT_SIZE);
    bytes.push(NOTE_PLAINTEXT_LEAD_BYTE);
    bytes.extend_from_slice(&value.as_u64().to_le_bytes());
    bytes.extend_from_slice(rseed.as_bytes());
    bytes.extend_from_slice(memo);
    bytes
}

/// Deserialize plaintext after decryption
fn deserialize_plaintext(bytes: &[u8]) -> Option<(NoteValue, RandomSeed, Memo)> {
    if bytes.len() != NOTE_PLAINTEXT_SIZE || bytes[0] != NOTE_PLAINTEXT_LEAD_BYTE {
        return None;
    }

    let value = u64::from_le_bytes(bytes[1..9].try_into().ok()?);
    let rseed: [u8; 32] = bytes[9..41].try_into().ok()?;
    let memo: Memo = bytes[41..].try_into().ok()?;

    Some((NoteValue::new(value), RandomSeed::from_bytes(rseed), memo))
}
