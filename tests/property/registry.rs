//! Property-based tests for the conversation registry and unread markers.
//!
//! Uses proptest to verify, for arbitrary sequences of operations:
//! 1. The log conversation stays at index 0 and ids stay unique.
//! 2. The current and previous pointers always stay in bounds.
//! 3. Closing the current conversation never leaves it current; closing
//!    any other conversation keeps the current one.
//! 4. Unread markers render in ascending order and never mark the current
//!    conversation.

use proptest::prelude::*;
use rosterchat::session::notify::{UnreadKind, UnreadSet};
use rosterchat::session::registry::ConversationRegistry;
use rosterchat_proto::id::{ConversationId, PeerId, RoomId};

#[derive(Debug, Clone)]
enum Op {
    Open(ConversationId),
    Close(usize),
    Switch(usize),
}

/// Strategy for a small pool of conversation ids, so opens collide often.
fn arb_conversation() -> impl Strategy<Value = ConversationId> {
    prop_oneof![
        (0u32..5).prop_map(|n| ConversationId::Peer(
            PeerId::parse(&format!("765611980000{n:05}")).unwrap()
        )),
        (0u32..5).prop_map(|n| ConversationId::Room(
            RoomId::parse(&format!("1035827914300{n:05}")).unwrap()
        )),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => arb_conversation().prop_map(Op::Open),
        2 => (0usize..12).prop_map(Op::Close),
        2 => (0usize..12).prop_map(Op::Switch),
    ]
}

fn arb_kind() -> impl Strategy<Value = UnreadKind> {
    prop_oneof![Just(UnreadKind::Room), Just(UnreadKind::Direct)]
}

fn check_invariants(registry: &ConversationRegistry) -> Result<(), TestCaseError> {
    prop_assert_eq!(registry.get(0), Some(&ConversationId::Log));
    prop_assert!(registry.current_index() < registry.len());
    prop_assert!(registry.previous_index() < registry.len());
    let ids: Vec<_> = registry.iter().collect();
    for (i, id) in ids.iter().enumerate() {
        prop_assert!(!ids[i + 1..].contains(id), "duplicate id {id}");
    }
    Ok(())
}

proptest! {
    #[test]
    fn registry_invariants_hold(ops in prop::collection::vec(arb_op(), 0..64)) {
        let mut registry = ConversationRegistry::new();
        for op in ops {
            match op {
                Op::Open(id) => {
                    let before = registry.len();
                    let (index, created) = registry.open(id.clone());
                    prop_assert_eq!(registry.get(index), Some(&id));
                    prop_assert_eq!(registry.len(), before + usize::from(created));
                }
                Op::Close(index) => {
                    let current = registry.current().clone();
                    let was_current = index == registry.current_index();
                    match registry.close(index) {
                        Ok(closed) => {
                            prop_assert_eq!(closed.switched, was_current);
                            prop_assert_ne!(registry.current(), &closed.id);
                            if !was_current {
                                prop_assert_eq!(registry.current(), &current);
                            }
                        }
                        Err(_) => prop_assert!(index == 0 || index >= registry.len()),
                    }
                }
                Op::Switch(index) => {
                    let current = registry.current_index();
                    if registry.switch_to(index).is_ok() {
                        prop_assert_eq!(registry.current_index(), index);
                        prop_assert_eq!(registry.previous_index(), current);
                    } else {
                        prop_assert!(index >= registry.len());
                    }
                }
            }
            check_invariants(&registry)?;
        }
    }

    #[test]
    fn unread_renders_ascending(
        marks in prop::collection::vec((1usize..20, arb_kind()), 0..32),
        current in 0usize..20,
    ) {
        let mut unread = UnreadSet::new();
        for (index, kind) in marks {
            unread.mark_unread(index, kind, current);
        }
        prop_assert!(!unread.contains(current));
        let positions: Vec<usize> = unread.render().iter().map(|t| t.position).collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        sorted.dedup();
        prop_assert_eq!(positions, sorted);
    }

    #[test]
    fn unread_follows_removal(
        marks in prop::collection::btree_set(1usize..20, 0..12),
        removed in 1usize..20,
    ) {
        let mut unread = UnreadSet::new();
        for &index in &marks {
            unread.mark_unread(index, UnreadKind::Room, 0);
        }
        unread.on_removed(removed);

        let expected: Vec<usize> = marks
            .iter()
            .filter(|&&i| i != removed)
            .map(|&i| if i > removed { i } else { i + 1 })
            .collect();
        let positions: Vec<usize> = unread.render().iter().map(|t| t.position).collect();
        prop_assert_eq!(positions, expected);
    }
}

#[test]
fn unread_example_renders_sorted() {
    let mut unread = UnreadSet::new();
    for index in [10, 1, 8] {
        unread.mark_unread(index, UnreadKind::Room, 0);
    }
    let positions: Vec<usize> = unread.render().iter().map(|t| t.position).collect();
    assert_eq!(positions, vec![2, 9, 11]);
}
