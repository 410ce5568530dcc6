use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use trellis_di::BoxedValue;

/// Identifies one stubbed member
///
/// `arguments` is the hash over a specific argument tuple; `None` stands
/// for "any arguments" and is also the shape of zero-argument members.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub(crate) struct MemberKey {
    pub(crate) member: &'static str,
    pub(crate) arguments: Option<u64>,
}

type Produce = Arc<dyn Fn() -> BoxedValue + Send + Sync>;

/// The stub table of one mock
///
/// Binding the same key twice replaces the earlier stub.
#[derive(Default)]
pub(crate) struct StubRepository {
    stubs: Mutex<HashMap<MemberKey, Produce>>,
}

impl StubRepository {
    pub(crate) fn bind(&self, key: MemberKey, produce: Produce) {
        tracing::trace!("Stubbing '{}' (arguments: {:?})", key.member, key.arguments);
        self.lock().insert(key, produce);
    }

    /// Look up a stub for a call, preferring the argument-specific binding
    /// over the member-wide one
    pub(crate) fn lookup(&self, member: &'static str, arguments: Option<u64>) -> Option<BoxedValue> {
        let stubs = self.lock();
        let produce = arguments
            .and_then(|arguments| {
                stubs.get(&MemberKey {
                    member,
                    arguments: Some(arguments),
                })
            })
            .or_else(|| {
                stubs.get(&MemberKey {
                    member,
                    arguments: None,
                })
            })?;
        Some(produce())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<MemberKey, Produce>> {
        self.stubs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn produce(value: u32) -> Produce {
        Arc::new(move || Box::new(value))
    }

    #[test]
    fn rebinding_a_key_replaces_the_stub() {
        let repository = StubRepository::default();
        let key = MemberKey {
            member: "count",
            arguments: None,
        };
        repository.bind(key.clone(), produce(1));
        repository.bind(key, produce(2));
        let value = repository.lookup("count", None).unwrap();
        assert_eq!(*value.downcast::<u32>().unwrap(), 2);
    }

    #[test]
    fn argument_specific_stubs_win_over_member_wide_ones() {
        let repository = StubRepository::default();
        repository.bind(
            MemberKey {
                member: "price",
                arguments: None,
            },
            produce(1),
        );
        repository.bind(
            MemberKey {
                member: "price",
                arguments: Some(7),
            },
            produce(2),
        );
        let value = repository.lookup("price", Some(7)).unwrap();
        assert_eq!(*value.downcast::<u32>().unwrap(), 2);
        let fallback = repository.lookup("price", Some(8)).unwrap();
        assert_eq!(*fallback.downcast::<u32>().unwrap(), 1);
    }
}
