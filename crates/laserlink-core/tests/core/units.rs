use laserlink_core::units::{mm2px, px2mm, Resolution};
use proptest::prelude::*;

#[test]
fn test_end_to_end_conversion_constant() {
    // 100px at 500dpi is 100/500*25.4 mm
    assert!((px2mm(100.0, 500.0).unwrap() - 5.08).abs() < 1e-12);
}

#[test]
fn test_bed_size_in_pixels() {
    let r = Resolution::new(500.0).unwrap();
    assert!((r.mm_to_px(250.0) - 4921.259842519685).abs() < 1e-6);
}

proptest! {
    #[test]
    fn px_mm_round_trip(px in -100_000i32..100_000, dpi in 1.0f64..5000.0) {
        let r = Resolution::new(dpi).unwrap();
        let back = r.mm_to_px(r.px_to_mm(f64::from(px)));
        prop_assert!((back - f64::from(px)).abs() < 1e-6);
        prop_assert_eq!(back.round() as i32, px);
    }

    #[test]
    fn mm_px_round_trip(mm in -1000.0f64..1000.0, dpi in 1.0f64..5000.0) {
        let back = px2mm(mm2px(mm, dpi).unwrap(), dpi).unwrap();
        prop_assert!((back - mm).abs() < 1e-9);
    }

    #[test]
    fn non_positive_resolution_rejected(dpi in -1000.0f64..=0.0) {
        prop_assert!(Resolution::new(dpi).is_err());
    }
}
