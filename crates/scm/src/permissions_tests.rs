use super::*;

fn caps(pull: bool, push: bool, admin: bool) -> Capabilities {
    Capabilities { pull, push, admin }
}

#[test]
fn provider_tiers_map_to_expected_capabilities() {
    let table = [
        (0, caps(false, false, false)),
        (10, caps(false, false, false)),
        (20, caps(true, false, false)),
        (30, caps(true, true, false)),
        (40, caps(true, true, true)),
        (50, caps(true, true, true)),
    ];
    for (level, expected) in table {
        assert_eq!(
            map_access_level(AccessLevel::new(level)),
            expected,
            "level {level}"
        );
    }
}

#[test]
fn levels_between_tiers_take_the_lower_tier() {
    assert_eq!(map_access_level(AccessLevel::new(19)), caps(false, false, false));
    assert_eq!(map_access_level(AccessLevel::new(25)), caps(true, false, false));
    assert_eq!(map_access_level(AccessLevel::new(39)), caps(true, true, false));
    assert_eq!(map_access_level(AccessLevel::new(60)), caps(true, true, true));
}

#[test]
fn mapping_is_monotonic() {
    for a in 0..=60 {
        for b in a..=60 {
            let lower = map_access_level(AccessLevel::new(a));
            let higher = map_access_level(AccessLevel::new(b));
            assert!(lower.is_subset_of(higher), "level {a} vs {b}");
        }
    }
}

#[test]
fn capability_sets_are_cumulative() {
    for level in 0..=60 {
        let c = map_access_level(AccessLevel::new(level));
        if c.push {
            assert!(c.pull, "level {level}");
        }
        if c.admin {
            assert!(c.push && c.pull, "level {level}");
        }
    }
}
