mod common;

use std::sync::OnceLock;

use common::TestFixture;
use proptest::prelude::*;
use shroud_bundle::{Authorized, Builder, Bundle, BundleError, BundleState, Flags, PendingBundle};
use shroud_privacy::redjubjub::{Binding, SigningKey};
use shroud_privacy::{Anchor, SeededRandomness, ValueCommitTrapdoor, ValueCommitment, ValueSum};
use shroud_prover::ProvingKey;

const SIGHASH: [u8; 32] = [0x42; 32];

/// Build, sign, prove and finalize a bundle spending `spends` and creating
/// `outputs`, all from the fixture seeded with `seed`.
fn authorized_bundle(seed: u64, spends: &[u64], outputs: &[u64]) -> Bundle<Authorized> {
    let mut fx = TestFixture::new(seed);
    let notes: Vec<_> = spends.iter().map(|v| fx.receive(*v)).collect();

    let mut builder = Builder::new(Flags::ENABLED, fx.anchor());
    for note in &notes {
        builder.add_spend(fx.spend(note)).unwrap();
    }
    for value in outputs {
        let output = fx.output(*value);
        builder.add_output(output).unwrap();
    }

    let (bundle, _) = builder.build(&mut fx.rng).unwrap();
    let mut prepared = bundle.prepare(&mut fx.rng, SIGHASH);
    prepared.sign(&mut fx.rng, &fx.wallet.ask);
    prepared
        .create_proof(&ProvingKey::mock(), &mut fx.rng)
        .unwrap()
        .finalize()
        .unwrap()
}

/// A valid encoding shared by the decoder tests.
fn valid_encoding() -> &'static [u8] {
    static BYTES: OnceLock<Vec<u8>> = OnceLock::new();
    BYTES.get_or_init(|| authorized_bundle(16, &[70], &[30, 20]).to_bytes())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn test_value_conservation(
        spends in prop::collection::vec(0u64..1_000_000, 0..3),
        outputs in prop::collection::vec(0u64..1_000_000, 1..3),
        seed in any::<u64>(),
    ) {
        let mut fx = TestFixture::new(seed);
        let notes: Vec<_> = spends.iter().map(|v| fx.receive(*v)).collect();
        let mut builder = Builder::new(Flags::ENABLED, fx.anchor());
        for note in &notes {
            builder.add_spend(fx.spend(note)).unwrap();
        }
        for value in &outputs {
            let output = fx.output(*value);
            builder.add_output(output).unwrap();
        }

        let expected = spends.iter().map(|v| *v as i64).sum::<i64>()
            - outputs.iter().map(|v| *v as i64).sum::<i64>();
        let (bundle, _) = builder.build(&mut fx.rng).unwrap();
        prop_assert_eq!(bundle.value_balance(), expected);

        // sum(cv_net) - [balance] V == [sum(rcv)] R
        let bsk: ValueCommitTrapdoor = bundle.secrets().iter().map(|s| *s.rcv()).sum();
        let bsk = SigningKey::<Binding>::from_scalar(bsk.inner()).unwrap();
        prop_assert_eq!(bsk.verification_key(), bundle.binding_validating_key());

        let mut prepared = bundle.prepare(&mut fx.rng, SIGHASH);
        prepared.sign(&mut fx.rng, &fx.wallet.ask);
        let authorized = prepared
            .create_proof(&ProvingKey::mock(), &mut fx.rng)
            .unwrap()
            .finalize()
            .unwrap();
        prop_assert!(authorized.verify_binding(&SIGHASH));
    }

    #[test]
    fn test_decoding_arbitrary_bytes_never_panics(
        bytes in prop::collection::vec(any::<u8>(), 0..1024),
    ) {
        let _ = Bundle::<Authorized>::from_bytes(&bytes);
    }
}

proptest! {
    #[test]
    fn test_decoding_mutated_encoding(
        edits in prop::collection::vec((any::<prop::sample::Index>(), any::<u8>()), 1..4),
    ) {
        let mut bytes = valid_encoding().to_vec();
        for (at, value) in edits {
            let i = at.index(bytes.len());
            bytes[i] = value;
        }

        // Whatever decodes must re-encode to the same bytes
        if let Ok(bundle) = Bundle::<Authorized>::from_bytes(&bytes) {
            prop_assert_eq!(bundle.to_bytes(), bytes);
        }
    }

    #[test]
    fn test_decoding_truncated_encoding(cut in any::<prop::sample::Index>()) {
        let bytes = valid_encoding();
        let len = cut.index(bytes.len());
        prop_assert!(Bundle::<Authorized>::from_bytes(&bytes[..len]).is_err());
    }
}

#[test]
fn test_nullifier_determinism() {
    let mut fx = TestFixture::new(11);
    let note = fx.receive(90);
    let other = fx.receive(90);
    let expected = note.nullifier(&fx.wallet.fvk);

    assert_eq!(note.nullifier(&fx.wallet.fvk), expected, "same note, same key");
    assert_ne!(other.nullifier(&fx.wallet.fvk), expected, "equal values still differ");

    // Two independent builds of the same spend publish the same nullifier
    for seed in [1u8, 2u8] {
        let mut rng = SeededRandomness::from_seed([seed; 32]);
        let mut builder = Builder::new(Flags::ENABLED, fx.anchor());
        builder.add_spend(fx.spend(&note)).unwrap();
        let (bundle, metadata) = builder.build(&mut rng).unwrap();

        let index = metadata.spend_action_index(0).unwrap();
        assert_eq!(*bundle.actions()[index].nullifier(), expected);
    }
}

#[test]
fn test_nullifiers_unique_within_bundle() {
    let bundle = authorized_bundle(12, &[5, 5, 5], &[3]);
    let mut nullifiers: Vec<_> = bundle
        .actions()
        .iter()
        .map(|a| a.nullifier().to_bytes())
        .collect();
    nullifiers.sort_unstable();
    nullifiers.dedup();
    assert_eq!(nullifiers.len(), bundle.actions().len());
}

#[test]
fn test_state_machine_enforcement() {
    let mut fx = TestFixture::new(13);
    let mut builder = Builder::new(Flags::ENABLED, Anchor::empty());
    let output = fx.output(1);
    builder.add_output(output).unwrap();
    let pk = ProvingKey::mock();

    let mut pending = PendingBundle::from(builder.build(&mut fx.rng).unwrap().0);
    assert_eq!(pending.state(), BundleState::Unauthorized);
    assert_eq!(pending.finalize(), Err(BundleError::NotYetProven));
    assert_eq!(pending.serialized(), Err(BundleError::NotFinalized));
    assert_eq!(pending.append_signatures(&[]), Err(BundleError::NotYetPrepared));

    pending.prepare(&mut fx.rng, SIGHASH).unwrap();
    assert_eq!(pending.finalize(), Err(BundleError::NotYetProven));
    assert_eq!(pending.prepare(&mut fx.rng, SIGHASH), Err(BundleError::AlreadyPrepared));

    pending.create_proof(&pk, &mut fx.rng).unwrap();
    assert_eq!(pending.prepare(&mut fx.rng, SIGHASH), Err(BundleError::AlreadyPrepared));
    assert_eq!(pending.create_proof(&pk, &mut fx.rng), Err(BundleError::AlreadyProven));
    assert_eq!(pending.serialized(), Err(BundleError::NotFinalized));

    pending.finalize().unwrap();
    assert_eq!(pending.prepare(&mut fx.rng, SIGHASH), Err(BundleError::AlreadyPrepared));
    assert_eq!(pending.create_proof(&pk, &mut fx.rng), Err(BundleError::AlreadyProven));
    assert_eq!(pending.finalize(), Err(BundleError::AlreadyAuthorized));
    assert_eq!(
        pending.sign(&mut fx.rng, &fx.wallet.ask),
        Err(BundleError::AlreadyAuthorized)
    );
    assert_eq!(pending.state(), BundleState::Authorized);
}

#[test]
fn test_round_trip_and_byte_stability() {
    let first = authorized_bundle(14, &[100, 200], &[250, 40]);
    let second = authorized_bundle(14, &[100, 200], &[250, 40]);

    let bytes = first.to_bytes();
    assert_eq!(bytes, second.to_bytes(), "same seed, same bytes");

    let decoded = Bundle::<Authorized>::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, first);
    assert_eq!(decoded.to_bytes(), bytes);
    assert!(decoded.verify(&ProvingKey::mock(), &SIGHASH));
}

#[test]
fn test_binding_signature_detects_tampered_cv() {
    let bundle = authorized_bundle(15, &[60], &[20, 30]);
    assert!(bundle.verify_binding(&SIGHASH));

    // Replace the first action's cv_net with a different valid point
    let mut bytes = bundle.to_bytes();
    let cv_at = 2 + 32 + 32;
    let original = *bundle.actions()[0].cv_net();
    let tampered = original + ValueCommitment::balance(ValueSum::from_raw(1));
    bytes[cv_at..cv_at + 32].copy_from_slice(&tampered.to_bytes());

    let decoded = Bundle::<Authorized>::from_bytes(&bytes).unwrap();
    assert_eq!(*decoded.actions()[0].cv_net(), tampered);
    assert!(!decoded.verify_binding(&SIGHASH));
    assert!(
        !decoded.verify_proof(&ProvingKey::mock()),
        "proof is bound to the original cv"
    );
}
