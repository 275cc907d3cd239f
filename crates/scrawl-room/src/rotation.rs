//! Turn rotation: who draws next.
//!
//! The rotation order is the member insertion order, which never
//! reshuffles on membership changes. The current drawer is located by
//! name, not by a stored index, so members leaving earlier in the list
//! can't shift the rotation onto the wrong person.

use scrawl_protocol::Username;

/// Picks the next drawer from `order` (insertion order), given the
/// current drawer.
///
/// Rules:
/// - empty order → `None`;
/// - no current drawer, or the current drawer is no longer present →
///   the first member;
/// - otherwise the member immediately after the current drawer,
///   wrapping to the front.
pub fn next_drawer(
    order: &[Username],
    current: Option<&Username>,
) -> Option<Username> {
    if order.is_empty() {
        return None;
    }

    let next_index = match current
        .and_then(|name| order.iter().position(|n| n == name))
    {
        None => 0,
        Some(i) => (i + 1) % order.len(),
    };

    Some(order[next_index].clone())
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn order(names: &[&str]) -> Vec<Username> {
        names.iter().map(|n| Username::from(*n)).collect()
    }

    #[test]
    fn test_next_drawer_empty_order_returns_none() {
        assert_eq!(next_drawer(&[], None), None);
        assert_eq!(
            next_drawer(&[], Some(&Username::from("ghost"))),
            None
        );
    }

    #[test]
    fn test_next_drawer_no_current_picks_first() {
        let members = order(&["ala", "bob", "cat"]);
        assert_eq!(
            next_drawer(&members, None),
            Some(Username::from("ala"))
        );
    }

    #[test]
    fn test_next_drawer_departed_current_picks_first() {
        // The prior drawer left the room — restart from the front.
        let members = order(&["ala", "bob", "cat"]);
        assert_eq!(
            next_drawer(&members, Some(&Username::from("gone"))),
            Some(Username::from("ala"))
        );
    }

    #[test]
    fn test_next_drawer_advances_to_following_member() {
        let members = order(&["ala", "bob", "cat"]);
        assert_eq!(
            next_drawer(&members, Some(&Username::from("ala"))),
            Some(Username::from("bob"))
        );
    }

    #[test]
    fn test_next_drawer_wraps_to_front() {
        let members = order(&["ala", "bob", "cat"]);
        assert_eq!(
            next_drawer(&members, Some(&Username::from("cat"))),
            Some(Username::from("ala"))
        );
    }

    #[test]
    fn test_next_drawer_single_member_rotates_to_itself() {
        let members = order(&["ala"]);
        assert_eq!(
            next_drawer(&members, Some(&Username::from("ala"))),
            Some(Username::from("ala"))
        );
    }

    #[test]
    fn test_rotation_is_cyclic_permutation() {
        // After exactly N rotations the drawer returns to the start,
        // for any membership size.
        for n in 1..=6 {
            let names: Vec<String> =
                (0..n).map(|i| format!("player{i}")).collect();
            let members: Vec<Username> =
                names.iter().map(|n| Username::from(n.as_str())).collect();

            let start = members[0].clone();
            let mut drawer = start.clone();
            for _ in 0..n {
                drawer = next_drawer(&members, Some(&drawer)).unwrap();
            }
            assert_eq!(drawer, start, "cycle length must be {n}");
        }
    }
}
