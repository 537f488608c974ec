use std::sync::atomic::{AtomicUsize, Ordering};

use regula_core::{CodepointSet, PropertyResolver};

use crate::node::{Encoding, pack_str};
use crate::opcode::Opcode;
use crate::program::{
    Captures, ClassData, DecodeError, DeferredProperty, Program, ProgramParts, validate,
};

fn exact_then_end(text: &str) -> Vec<u32> {
    let enc = Encoding::default();
    let mut code = vec![Encoding::header(Opcode::Exact, 0)];
    code.extend(pack_str(text.as_bytes()));
    let end = code.len();
    code.push(Encoding::header(Opcode::End, 0));
    enc.write_next(&mut code, 0, end).unwrap();
    code
}

#[test]
fn validate_accepts_well_formed_code() {
    assert_eq!(validate(&exact_then_end("foo"), Encoding::default()), Ok(()));
}

#[test]
fn validate_rejects_bad_opcode() {
    let code = vec![0xFF];
    assert_eq!(
        validate(&code, Encoding::default()),
        Err(DecodeError::InvalidOpcode {
            offset: 0,
            byte: 0xFF
        })
    );
}

#[test]
fn validate_rejects_truncated_literal() {
    let mut code = exact_then_end("foobar");
    code.truncate(2);
    assert_eq!(
        validate(&code, Encoding::default()),
        Err(DecodeError::Truncated { offset: 0 })
    );
}

#[test]
fn validate_rejects_dangling_next() {
    let mut code = exact_then_end("foo");
    Encoding::default().write_next(&mut code, 0, 40).unwrap();
    assert!(matches!(
        validate(&code, Encoding::default()),
        Err(DecodeError::DanglingNext { offset: 0, .. })
    ));
}

#[test]
fn checksum_tracks_code() {
    let a = Program::from_parts(ProgramParts {
        code: exact_then_end("foo"),
        ..Default::default()
    })
    .unwrap();
    let b = Program::from_parts(ProgramParts {
        code: exact_then_end("fox"),
        ..Default::default()
    })
    .unwrap();
    assert_ne!(a.checksum(), b.checksum());
    assert_eq!(a.checksum(), a.checksum());
}

#[test]
fn physicals_follow_chain() {
    // (a)(?|(b)|(c))(d): logical 1,2,2,3
    let captures = Captures {
        physical: 4,
        logical: 3,
        physical_to_logical: vec![0, 1, 2, 2, 3],
        logical_to_physical: vec![0, 1, 2, 4],
        next_physical: vec![0, 0, 3, 0, 0],
        names: Default::default(),
    };
    assert_eq!(captures.physicals_of(2), vec![2, 3]);
    assert_eq!(captures.physicals_of(3), vec![4]);
    assert_eq!(captures.logical_of(3), Some(2));
}

struct CountingResolver(AtomicUsize);

impl PropertyResolver for CountingResolver {
    fn resolve(&self, name: &str) -> Option<CodepointSet> {
        self.0.fetch_add(1, Ordering::SeqCst);
        (name == "IsVowel").then(|| CodepointSet::from_codepoints("aeiou".chars().map(|c| c as u32)))
    }
}

#[test]
fn deferred_resolves_once() {
    let program = Program::from_parts(ProgramParts {
        code: exact_then_end("x"),
        classes: vec![ClassData {
            deferred: Some(DeferredProperty::new("IsVowel", false)),
            ..Default::default()
        }],
        ..Default::default()
    })
    .unwrap();
    let resolver = CountingResolver(AtomicUsize::new(0));

    assert_eq!(program.resolve_deferred(&resolver), 1);
    assert_eq!(program.resolve_deferred(&resolver), 1);
    assert_eq!(resolver.0.load(Ordering::SeqCst), 1);

    let set = program.classes()[0].deferred.as_ref().unwrap().get().unwrap();
    assert!(set.contains('e' as u32));
}

#[test]
fn deferred_negation_applies_on_resolve() {
    let d = DeferredProperty::new("IsVowel", true);
    let resolver = CountingResolver(AtomicUsize::new(0));
    let set = d.resolve(&resolver).unwrap();
    assert!(!set.contains('a' as u32));
    assert!(set.contains('b' as u32));
}

#[test]
fn deferred_resolves_across_threads() {
    let d = DeferredProperty::new("IsVowel", false);
    let resolver = CountingResolver(AtomicUsize::new(0));
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                assert!(d.resolve(&resolver).is_some());
            });
        }
    });
    assert_eq!(resolver.0.load(Ordering::SeqCst), 1);
}
