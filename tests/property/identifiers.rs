//! Property-based tests for identifier parsing and classification.
//!
//! Uses proptest to verify:
//! 1. Well-formed account and room ids parse and classify by length.
//! 2. Arbitrary input never panics and only classifies at the two lengths.
//! 3. Presence codes always map to a state with a consistent rank.

use proptest::prelude::*;
use rosterchat_proto::id::{ConversationId, PEER_ID_LEN, PeerId, ROOM_ID_LEN, RoomId};
use rosterchat_proto::presence::PresenceState;
use rosterchat_proto::roster::MemberRank;

proptest! {
    #[test]
    fn account_ids_classify_as_peers(suffix in "[0-9]{10}") {
        let raw = format!("7656119{suffix}");
        let peer = PeerId::parse(&raw).unwrap();
        prop_assert_eq!(peer.as_str(), raw.as_str());
        prop_assert_eq!(
            ConversationId::classify(&raw).unwrap(),
            ConversationId::Peer(peer)
        );
    }

    #[test]
    fn room_ids_classify_as_rooms(raw in "[0-9]{18}") {
        let room = RoomId::parse(&raw).unwrap();
        prop_assert_eq!(room.to_string(), raw.clone());
        prop_assert_eq!(
            ConversationId::classify(&raw).unwrap(),
            ConversationId::Room(room)
        );
    }

    #[test]
    fn account_ids_need_the_prefix(raw in "[0-9]{17}") {
        prop_assume!(!raw.starts_with("7656119"));
        prop_assert!(PeerId::parse(&raw).is_err());
        prop_assert!(ConversationId::classify(&raw).is_err());
    }

    #[test]
    fn classify_never_panics(raw in "\\PC{0,24}") {
        if let Ok(id) = ConversationId::classify(&raw) {
            let len = raw.trim().len();
            prop_assert!(len == PEER_ID_LEN || len == ROOM_ID_LEN);
            prop_assert!(id != ConversationId::Log);
        }
    }

    #[test]
    fn presence_codes_map_consistently(code in any::<u8>()) {
        let state = PresenceState::from_code(code);
        prop_assert_eq!(state.is_offline(), state.rank() == 0);
        if code > 4 {
            prop_assert_eq!(state, PresenceState::Other);
        }
    }

    #[test]
    fn rank_codes_never_panic(code in any::<u32>()) {
        let rank = MemberRank::from_code(code);
        if ![2, 4, 8].contains(&code) {
            prop_assert_eq!(rank, MemberRank::Other);
        }
    }
}

#[test]
fn presence_rank_order() {
    let ordered = [
        PresenceState::Online,
        PresenceState::Busy,
        PresenceState::Away,
        PresenceState::Snooze,
        PresenceState::Other,
        PresenceState::Offline,
    ];
    for pair in ordered.windows(2) {
        assert!(pair[0].rank() > pair[1].rank());
    }
}
