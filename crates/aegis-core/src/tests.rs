#[cfg(test)]
mod tests {
    use glam::DVec3;

    use crate::asset::{AssetMap, AssetRecord, ChainAdjust, WeaponRecord};
    use crate::enums::*;
    use crate::id::Id;
    use crate::messages::{CombatStatusMessage, TrackUpdateMessage, WeaponSystemStatus};
    use crate::track::TrackRecord;

    fn track_update(track_id: Id, time: f64) -> TrackUpdateMessage {
        TrackUpdateMessage {
            sender: Id::unit(1),
            track_id,
            status: TrackingStatus::Normal,
            position_m: DVec3::new(1000.0, 2000.0, 3000.0),
            velocity_ms: DVec3::new(100.0, 0.0, 0.0),
            data_time: time,
            reporting_sensor: Some(SensorKind::Ew),
            truth_name: "vampire-01".into(),
        }
    }

    // ---- Identifiers ----

    #[test]
    fn test_id_validity_and_unit_comparison() {
        assert!(!Id::NONE.is_valid());
        assert!(!Id::new(0, 3).is_valid());
        assert!(Id::unit(7).is_valid());

        let weapon = Id::new(7, 2);
        assert!(weapon.same_unit(&Id::unit(7)));
        assert!(!weapon.same_unit(&Id::unit(8)));
        assert_eq!(weapon.unit_part(), Id::unit(7));
        assert_eq!(format!("{weapon}"), "7:2");
    }

    // ---- Enums ----

    #[test]
    fn test_ack_status_terminal_subset() {
        let terminal = [
            AckStatus::Kill,
            AckStatus::Cancelled,
            AckStatus::HavcoSuccess,
            AckStatus::HavcoFailure,
        ];
        for status in terminal {
            assert!(status.is_terminal(), "{status:?} should be terminal");
            assert!(status.closes_assignment());
        }

        assert!(!AckStatus::Cantco.is_terminal());
        assert!(AckStatus::Cantco.closes_assignment());

        for status in [AckStatus::Wilco, AckStatus::Firing, AckStatus::Miss] {
            assert!(!status.is_terminal());
            assert!(!status.closes_assignment());
        }

        assert!(AckStatus::Kill.is_success());
        assert!(AckStatus::HavcoSuccess.is_success());
        assert!(!AckStatus::HavcoFailure.is_success());
        assert!(!AckStatus::Cancelled.is_success());
    }

    #[test]
    fn test_shot_doctrine_missile_counts() {
        assert_eq!(ShotDoctrine::Shoot1.missile_count(), 1);
        assert_eq!(ShotDoctrine::Shoot2.missile_count(), 2);
        assert_eq!(ShotDoctrine::ShootLookShoot.missile_count(), 2);

        // Doctrine delta is new minus old (assumption recorded in DESIGN.md).
        assert_eq!(
            ShotDoctrine::difference(ShotDoctrine::Shoot2, ShotDoctrine::Shoot1),
            1
        );
        assert_eq!(
            ShotDoctrine::difference(ShotDoctrine::Shoot1, ShotDoctrine::ShootLookShoot),
            -1
        );
        assert_eq!(
            ShotDoctrine::difference(ShotDoctrine::Shoot2, ShotDoctrine::ShootLookShoot),
            0
        );
    }

    #[test]
    fn test_enum_serde_round_trips() {
        for status in [
            AckStatus::Wilco,
            AckStatus::ChangedAssignedUnit,
            AckStatus::Cantco,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            let back: AckStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(status, back);
        }
        for status in [
            SystemStatus::Green,
            SystemStatus::White,
            SystemStatus::Yellow,
            SystemStatus::Red,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            let back: SystemStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(status, back);
        }
    }

    // ---- Tracks ----

    #[test]
    fn test_track_record_absorb_and_extrapolate() {
        let mut track = TrackRecord::from_update(&track_update(Id::unit(5), 10.0));
        assert_eq!(track.id, Id::unit(5));
        assert_eq!(track.update_time, 10.0);

        let mut update = track_update(Id::unit(5), 12.0);
        update.position_m = DVec3::new(1200.0, 2000.0, 3000.0);
        track.absorb_update(&update);
        assert_eq!(track.update_time, 12.0);
        assert_eq!(track.position_m.x, 1200.0);

        let extrapolated = track.extrapolated_position(14.0);
        assert_eq!(extrapolated.x, 1400.0);
        assert_eq!(extrapolated.y, 2000.0);
    }

    // ---- Weapons ----

    #[test]
    fn test_weapon_adjust_and_refresh() {
        let mut weapon = WeaponRecord::new(1, 8, 2);
        weapon.adjust(ChainAdjust::Debit, 1, 2);
        assert_eq!(weapon.estimated_munitions_prepped, 6);
        assert_eq!(weapon.estimated_allocated_fire_channels, 1);

        weapon.adjust(ChainAdjust::Credit, 1, 2);
        assert_eq!(weapon.estimated_munitions_prepped, 8);
        assert_eq!(weapon.estimated_allocated_fire_channels, 0);

        // Negative munitions flow the other way (doctrine deltas).
        weapon.adjust(ChainAdjust::Debit, 0, -1);
        assert_eq!(weapon.estimated_munitions_prepped, 9);

        weapon.refresh_perception();
        assert_eq!(weapon.estimated_munitions_prepped, 8);
        assert_eq!(weapon.estimated_allocated_fire_channels, 0);
    }

    // ---- Asset records ----

    #[test]
    fn test_asset_ageout_degrades_and_never_upgrades() {
        let mut asset = AssetRecord::new(Id::unit(3), "battery");
        asset.status_time = 100.0;

        asset.update_age(110.0);
        assert_eq!(asset.system_status, SystemStatus::Green);

        asset.update_age(100.0 + asset.yellow_ageout_s + 1.0);
        assert_eq!(asset.system_status, SystemStatus::Yellow);

        asset.update_age(100.0 + asset.red_ageout_s + 1.0);
        assert_eq!(asset.system_status, SystemStatus::Red);

        // Fresh ages never pull the status back up.
        asset.update_age(101.0);
        assert_eq!(asset.system_status, SystemStatus::Red);
    }

    #[test]
    fn test_absorb_status_preserves_weapon_perception_under_assignments() {
        let mut asset = AssetRecord::new(Id::unit(4), "sam-site");
        asset.weapons.push(WeaponRecord::new(1, 6, 2));
        asset.weapons[0].estimated_munitions_prepped = 4; // two committed

        let msg = CombatStatusMessage {
            sender: Id::unit(4),
            asset_id: Id::unit(4),
            status_time: 50.0,
            system_status: SystemStatus::Green,
            max_assignments: 3,
            current_assignments: 0,
            position_time: 50.0,
            position_m: DVec3::ZERO,
            velocity_ms: DVec3::ZERO,
            weapons: vec![WeaponSystemStatus {
                weapon_id: 1,
                munitions_ready: 6,
                total_munitions: 6,
                total_fire_channels: 2,
                allocated_fire_channels: 0,
            }],
        };

        asset.absorb_status(&msg, true);
        assert_eq!(asset.status_time, 50.0);
        assert_eq!(
            asset.weapons[0].estimated_munitions_prepped, 4,
            "perception must not be clobbered while assignments are active"
        );

        asset.absorb_status(&msg, false);
        assert_eq!(asset.weapons[0].estimated_munitions_prepped, 6);
    }

    #[test]
    fn test_weapon_status_white_when_out_of_munitions() {
        let mut asset = AssetRecord::new(Id::unit(4), "sam-site");
        assert_eq!(asset.weapon_status(false), SystemStatus::Red);

        asset.weapons.push(WeaponRecord::new(1, 4, 2));
        assert_eq!(asset.weapon_status(false), SystemStatus::Green);

        asset.weapons[0].estimated_munitions_prepped = 0;
        assert_eq!(asset.weapon_status(false), SystemStatus::White);
    }

    // ---- Asset map / chain of command ----

    /// Three-deep chain: 1 commands 2 commands 3; weapon 3:1 on the leaf.
    fn chain_fixture() -> AssetMap {
        let mut assets = AssetMap::new();

        let mut top = AssetRecord::new(Id::unit(1), "bde");
        top.subordinates = vec![Id::unit(2)];
        assets.insert(top);

        let mut mid = AssetRecord::new(Id::unit(2), "bn");
        mid.commander = Some(Id::unit(1));
        mid.subordinates = vec![Id::unit(3)];
        assets.insert(mid);

        let mut leaf = AssetRecord::new(Id::unit(3), "btry");
        leaf.commander = Some(Id::unit(2));
        leaf.weapons.push(WeaponRecord::new(1, 8, 2));
        assets.insert(leaf);

        assets
    }

    #[test]
    fn test_chain_path_and_subordinates() {
        let assets = chain_fixture();
        assert_eq!(
            assets.chain_path(Id::unit(1), Id::new(3, 1)),
            Some(vec![Id::unit(1), Id::unit(2), Id::unit(3)])
        );
        assert_eq!(assets.chain_path(Id::unit(2), Id::unit(1)), None);
        assert!(assets.is_subordinate(Id::unit(1), Id::unit(3)));
        assert!(!assets.is_subordinate(Id::unit(3), Id::unit(1)));
    }

    #[test]
    fn test_chain_red_detection() {
        let mut assets = chain_fixture();
        assert!(!assets.is_chain_red(Id::unit(1), Id::unit(3)));

        assets.get_mut(Id::unit(2)).unwrap().system_status = SystemStatus::Red;
        assert!(assets.is_chain_red(Id::unit(1), Id::unit(3)));
        // The broken middle does not taint sibling-free sub-chains.
        assert!(!assets.is_chain_red(Id::unit(3), Id::unit(3)));
    }

    #[test]
    fn test_adjust_chain_debit_credit_round_trip() {
        let mut assets = chain_fixture();
        let weapon = Id::new(3, 1);

        assets.adjust_chain(Id::unit(1), weapon, ChainAdjust::Debit, 1, 2);
        assert_eq!(assets.get(Id::unit(1)).unwrap().current_assignments, 1);
        assert_eq!(assets.get(Id::unit(2)).unwrap().current_assignments, 1);
        assert_eq!(assets.get(Id::unit(3)).unwrap().current_assignments, 1);
        let leaf_weapon = assets.get(Id::unit(3)).unwrap().weapon(1).unwrap();
        assert_eq!(leaf_weapon.estimated_munitions_prepped, 6);
        assert_eq!(leaf_weapon.estimated_allocated_fire_channels, 1);

        assets.adjust_chain(Id::unit(1), weapon, ChainAdjust::Credit, 1, 2);
        assert_eq!(assets.get(Id::unit(1)).unwrap().current_assignments, 0);
        assert_eq!(assets.get(Id::unit(3)).unwrap().current_assignments, 0);
        let leaf_weapon = assets.get(Id::unit(3)).unwrap().weapon(1).unwrap();
        assert_eq!(leaf_weapon.estimated_munitions_prepped, 8);
        assert_eq!(leaf_weapon.estimated_allocated_fire_channels, 0);
    }

    #[test]
    fn test_aggregate_weapon_status_uses_subordinates() {
        let assets = chain_fixture();
        // The brigade itself has no weapons but aggregates its chain.
        assert_eq!(
            assets.weapon_status(Id::unit(1), false, false),
            SystemStatus::Red
        );
        assert_eq!(
            assets.weapon_status(Id::unit(1), true, false),
            SystemStatus::Green
        );
    }
}
