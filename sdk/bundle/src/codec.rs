//! Canonical wire encoding of an authorized bundle.
//!
//! ```text
//! u8        format tag
//! compact   action count
//! per action:
//!   32  nullifier | 32 cmx | 32 cv_net | 32 rk | 32 epk
//!   569 enc_ciphertext | 112 out_ciphertext
//!   u32 LE proof component offset | 64 spend auth signature
//! i64 LE    value balance
//! 32        anchor
//! u8        flags
//! compact   proof length, proof bytes
//! 64        binding signature
//! ```

use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use shroud_privacy::redjubjub::{Signature, VerificationKey};
use shroud_privacy::{
    Anchor, ENC_CIPHERTEXT_SIZE, NoteCommitment, Nullifier, OUT_CIPHERTEXT_SIZE,
    TransmittedNoteCiphertext, ValueCommitment,
};

use crate::action::Action;
use crate::bundle::{Authorized, AuthorizedSpend, Bundle};
use crate::error::CodecError;
use crate::flags::Flags;
use crate::proof::Proof;

pub const BUNDLE_FORMAT_V1: u8 = 0x01;

/// Upper bound on actions per bundle
pub const MAX_ACTIONS: usize = 4096;

/// Upper bound on the aggregated proof
pub const MAX_PROOF_SIZE: usize = 16 * 1024 * 1024;

/// Encoded size of one action
pub const ACTION_SIZE: usize = 5 * 32 + ENC_CIPHERTEXT_SIZE + OUT_CIPHERTEXT_SIZE + 4 + 64;

/// Bitcoin-style CompactSize, always in its shortest form.
pub fn write_compact_size<W: Write>(writer: &mut W, n: u64) -> std::io::Result<()> {
    match n {
        0x00..=0xfc => writer.write_u8(n as u8),
        0xfd..=0xffff => {
            writer.write_u8(0xfd)?;
            writer.write_u16::<LittleEndian>(n as u16)
        }
        0x1_0000..=0xffff_ffff => {
            writer.write_u8(0xfe)?;
            writer.write_u32::<LittleEndian>(n as u32)
        }
        _ => {
            writer.write_u8(0xff)?;
            writer.write_u64::<LittleEndian>(n)
        }
    }
}

/// Reads a CompactSize, rejecting encodings longer than necessary.
pub fn read_compact_size<R: Read>(reader: &mut R) -> Result<u64, CodecError> {
    let flag = reader.read_u8()?;
    let n = match flag {
        n @ 0x00..=0xfc => u64::from(n),
        0xfd => match reader.read_u16::<LittleEndian>()? {
            n @ 0x00fd..=u16::MAX => u64::from(n),
            _ => return Err(CodecError::NonCanonicalCompactSize),
        },
        0xfe => match reader.read_u32::<LittleEndian>()? {
            n @ 0x0001_0000..=u32::MAX => u64::from(n),
            _ => return Err(CodecError::NonCanonicalCompactSize),
        },
        0xff => match reader.read_u64::<LittleEndian>()? {
            n @ 0x1_0000_0000..=u64::MAX => n,
            _ => return Err(CodecError::NonCanonicalCompactSize),
        },
    };
    Ok(n)
}

fn read_array<R: Read, const N: usize>(reader: &mut R) -> Result<[u8; N], CodecError> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

fn write_action<W: Write>(
    writer: &mut W,
    action: &Action<AuthorizedSpend>,
    offset: u32,
) -> std::io::Result<()> {
    let spend = action.authorization();
    let note = action.encrypted_note();

    writer.write_all(&action.nullifier().to_bytes())?;
    writer.write_all(&action.cmx().to_bytes())?;
    writer.write_all(&action.cv_net().to_bytes())?;
    writer.write_all(&spend.rk().to_bytes())?;
    writer.write_all(&note.epk_bytes)?;
    writer.write_all(&note.enc_ciphertext)?;
    writer.write_all(&note.out_ciphertext)?;
    writer.write_u32::<LittleEndian>(offset)?;
    writer.write_all(&spend.signature().to_bytes())
}

fn read_action<R: Read>(reader: &mut R) -> Result<(Action<AuthorizedSpend>, u32), CodecError> {
    let nf = Nullifier::from_bytes(&read_array(reader)?)
        .ok_or(CodecError::InvalidEncoding("nullifier"))?;
    let cmx = NoteCommitment::from_bytes(&read_array(reader)?)
        .ok_or(CodecError::InvalidEncoding("note commitment"))?;
    let cv_net = ValueCommitment::from_bytes(&read_array(reader)?)
        .ok_or(CodecError::InvalidEncoding("value commitment"))?;
    let rk = VerificationKey::from_bytes(&read_array(reader)?)
        .ok_or(CodecError::InvalidEncoding("randomized key"))?;
    let encrypted_note = TransmittedNoteCiphertext {
        epk_bytes: read_array(reader)?,
        enc_ciphertext: read_array(reader)?,
        out_ciphertext: read_array(reader)?,
    };
    let offset = reader.read_u32::<LittleEndian>()?;
    let signature = Signature::from_bytes(read_array(reader)?);

    let action = Action::from_parts(
        nf,
        cmx,
        cv_net,
        encrypted_note,
        AuthorizedSpend { rk, signature },
    );
    Ok((action, offset))
}

impl Bundle<Authorized> {
    pub fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let proof = &self.authorization.proof;

        writer.write_u8(BUNDLE_FORMAT_V1)?;
        write_compact_size(writer, self.actions.len() as u64)?;
        for (action, offset) in self.actions.iter().zip(proof.offsets()) {
            write_action(writer, action, offset)?;
        }
        writer.write_i64::<LittleEndian>(self.value_balance)?;
        writer.write_all(&self.anchor.to_bytes())?;
        writer.write_u8(self.flags.to_byte())?;

        let proof_bytes = proof.to_bytes();
        write_compact_size(writer, proof_bytes.len() as u64)?;
        writer.write_all(&proof_bytes)?;
        writer.write_all(&self.authorization.binding_signature.to_bytes())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(
            1 + 9 + self.actions.len() * ACTION_SIZE + 8 + 32 + 1 + 9
                + self.authorization.proof.byte_len()
                + 64,
        );
        self.write(&mut bytes).expect("writing to a Vec is infallible");
        bytes
    }

    /// Read one bundle; bytes after it are left in `reader`.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self, CodecError> {
        let tag = reader.read_u8()?;
        if tag != BUNDLE_FORMAT_V1 {
            return Err(CodecError::UnknownFormat(tag));
        }

        let count = read_compact_size(reader)?;
        if count == 0 {
            return Err(CodecError::NoActions);
        }
        if count > MAX_ACTIONS as u64 {
            return Err(CodecError::TooManyActions(count));
        }

        let mut actions = Vec::with_capacity(count as usize);
        let mut offsets = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let (action, offset) = read_action(reader)?;
            actions.push(action);
            offsets.push(offset);
        }

        let value_balance = reader.read_i64::<LittleEndian>()?;
        let anchor =
            Anchor::from_bytes(&read_array(reader)?).ok_or(CodecError::InvalidEncoding("anchor"))?;
        let flag_byte = reader.read_u8()?;
        let flags = Flags::from_byte(flag_byte).ok_or(CodecError::UnknownFlags(flag_byte))?;

        let proof_len = read_compact_size(reader)?;
        if proof_len > MAX_PROOF_SIZE as u64 {
            return Err(CodecError::ProofTooLarge(proof_len));
        }
        let mut proof_bytes = vec![0u8; proof_len as usize];
        reader.read_exact(&mut proof_bytes)?;
        let proof = Proof::from_parts(&proof_bytes, &offsets)?;

        let binding_signature = Signature::from_bytes(read_array(reader)?);

        Ok(Bundle {
            actions,
            flags,
            value_balance,
            anchor,
            authorization: Authorized {
                proof,
                binding_signature,
            },
        })
    }

    /// Decode a complete encoding; trailing bytes are an error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut cursor = Cursor::new(bytes);
        let bundle = Self::read(&mut cursor)?;
        let remaining = bytes.len() - cursor.position() as usize;
        if remaining != 0 {
            return Err(CodecError::TrailingBytes(remaining));
        }
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::descriptor::OutputDescriptor;
    use shroud_privacy::keys::random_address;
    use shroud_privacy::{NoteValue, SeededRandomness};
    use shroud_prover::ProvingKey;

    fn authorized(seed: u8, outputs: &[u64]) -> Bundle<Authorized> {
        let mut rng = SeededRandomness::from_seed([seed; 32]);
        let mut builder = Builder::new(Flags::ENABLED, Anchor::empty());
        for value in outputs {
            builder
                .add_output(OutputDescriptor::new(
                    None,
                    random_address(&mut rng),
                    NoteValue::new(*value),
                    None,
                ))
                .unwrap();
        }
        builder
            .build(&mut rng)
            .unwrap()
            .0
            .prepare(&mut rng, [0u8; 32])
            .create_proof(&ProvingKey::mock(), &mut rng)
            .unwrap()
            .finalize()
            .unwrap()
    }

    fn compact(n: u64) -> Vec<u8> {
        let mut out = Vec::new();
        write_compact_size(&mut out, n).unwrap();
        out
    }

    #[test]
    fn test_compact_size_boundaries() {
        assert_eq!(compact(0xfc), vec![0xfc]);
        assert_eq!(compact(0xfd), vec![0xfd, 0xfd, 0x00]);
        assert_eq!(compact(0xffff), vec![0xfd, 0xff, 0xff]);
        assert_eq!(compact(0x1_0000), vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(compact(0x1_0000_0000).len(), 9);

        for n in [0, 1, 0xfc, 0xfd, 0xffff, 0x1_0000, 0xffff_ffff, 0x1_0000_0000] {
            let bytes = compact(n);
            assert_eq!(read_compact_size(&mut Cursor::new(&bytes)).unwrap(), n);
        }
    }

    #[test]
    fn test_compact_size_rejects_long_forms() {
        for bytes in [
            vec![0xfd, 0xfc, 0x00],
            vec![0xfe, 0xff, 0xff, 0x00, 0x00],
            vec![0xff, 0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00],
        ] {
            assert_eq!(
                read_compact_size(&mut Cursor::new(&bytes)),
                Err(CodecError::NonCanonicalCompactSize)
            );
        }
    }

    #[test]
    fn test_encoded_length() {
        let bundle = authorized(40, &[3, 4]);
        let bytes = bundle.to_bytes();
        let proof_len = bundle.proof().byte_len();
        let proof_field = compact(proof_len as u64).len() + proof_len;
        assert_eq!(bytes.len(), 1 + 1 + 2 * ACTION_SIZE + 8 + 32 + 1 + proof_field + 64);
        assert_eq!(bytes[0], BUNDLE_FORMAT_V1);
        assert_eq!(bytes[1], 2);
    }

    #[test]
    fn test_to_bytes_matches_streamed_write() {
        let bundle = authorized(48, &[8]);
        let mut streamed = Vec::new();
        bundle.write(&mut streamed).unwrap();
        assert_eq!(bundle.to_bytes(), streamed);
    }

    #[test]
    fn test_round_trip() {
        let bundle = authorized(41, &[10, 20, 30]);
        let decoded = Bundle::<Authorized>::from_bytes(&bundle.to_bytes()).unwrap();
        assert_eq!(decoded, bundle);
        assert_eq!(decoded.to_bytes(), bundle.to_bytes());
    }

    #[test]
    fn test_rejects_unknown_format() {
        let mut bytes = authorized(42, &[1]).to_bytes();
        bytes[0] = 0x02;
        assert_eq!(
            Bundle::<Authorized>::from_bytes(&bytes),
            Err(CodecError::UnknownFormat(0x02))
        );
    }

    #[test]
    fn test_rejects_zero_and_too_many_actions() {
        assert_eq!(
            Bundle::<Authorized>::from_bytes(&[BUNDLE_FORMAT_V1, 0x00]),
            Err(CodecError::NoActions)
        );
        let mut bytes = vec![BUNDLE_FORMAT_V1];
        write_compact_size(&mut bytes, MAX_ACTIONS as u64 + 1).unwrap();
        assert_eq!(
            Bundle::<Authorized>::from_bytes(&bytes),
            Err(CodecError::TooManyActions(MAX_ACTIONS as u64 + 1))
        );
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let mut bytes = authorized(43, &[1]).to_bytes();
        bytes.push(0);
        assert_eq!(
            Bundle::<Authorized>::from_bytes(&bytes),
            Err(CodecError::TrailingBytes(1))
        );
    }

    #[test]
    fn test_rejects_truncated_input() {
        let bytes = authorized(44, &[1]).to_bytes();
        assert!(matches!(
            Bundle::<Authorized>::from_bytes(&bytes[..bytes.len() - 1]),
            Err(CodecError::Io(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_flags() {
        let bundle = authorized(45, &[1]);
        let mut bytes = bundle.to_bytes();
        let flags_at = 2 + ACTION_SIZE + 8 + 32;
        assert_eq!(bytes[flags_at], Flags::ENABLED.to_byte());
        bytes[flags_at] |= 0x04;
        assert_eq!(
            Bundle::<Authorized>::from_bytes(&bytes),
            Err(CodecError::UnknownFlags(0x07))
        );
    }

    #[test]
    fn test_rejects_non_canonical_nullifier() {
        let mut bytes = authorized(46, &[1]).to_bytes();
        // All ones is above the field modulus
        bytes[2..34].copy_from_slice(&[0xff; 32]);
        assert_eq!(
            Bundle::<Authorized>::from_bytes(&bytes),
            Err(CodecError::InvalidEncoding("nullifier"))
        );
    }

    #[test]
    fn test_rejects_nonzero_first_offset() {
        let mut bytes = authorized(47, &[1]).to_bytes();
        let offset_at = 2 + ACTION_SIZE - 64 - 4;
        bytes[offset_at] = 1;
        assert_eq!(
            Bundle::<Authorized>::from_bytes(&bytes),
            Err(CodecError::InvalidProofOffsets)
        );
    }
}
