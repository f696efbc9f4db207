//! End-to-end behaviour of the placement algebra
//!
//! Each test drives the public API the way a compiled aggregate program
//! would on a single device.

use fieldcalc_core::{
    DeviceId, Field, FieldError, Neighborhood, Opt, Placed, Pq, Runtime, Tier, TierBit, TierConfig,
    TierVisitor, dispatch_tier, fold_hood, fold_hood_except, get_or, make_placed, ops, pmap_hood,
    run_for_tier, wire,
};

fn bounds_of<const TIER: Tier, T: fieldcalc_core::Payload, S: fieldcalc_core::Placement>(
    _: &Placed<TIER, T, S>,
) -> (Tier, Tier) {
    (S::P_MASK, S::Q_MASK)
}

#[test]
fn test_runtime_opt_lifecycle() {
    let mut x: Opt<i32, Runtime> = Opt::default();
    assert_eq!(x.size(), 0);

    x.emplace(5);
    assert_eq!(x.size(), 1);
    assert_eq!(*x.front(), 5);

    x.clear();
    assert_eq!(x.size(), 0);
}

#[test]
fn test_self_sum_on_tier_8() {
    let x: Placed<8, i32, Pq<255, 0>> = Placed::new(1);
    let r = pmap_hood(|a: i32, b: i32| a + b, (&x, &x));
    assert_eq!(bounds_of(&r), (255, 0));
    assert_eq!(r.get_or(999), 2);
}

#[test]
fn test_mixed_payload_sum_widens_int_first() {
    let x: Placed<8, i32, Pq<12, 2>> = Placed::new(1);
    let y: Placed<8, f64, Pq<24, 4>> = Placed::new(2.0);

    let r = pmap_hood(|a: i32, b: f64| f64::from(a) + b, (&x, &y));
    assert_eq!(bounds_of(&r), (8, 6));
    assert_eq!(r.get_or(999.0), 3.0);

    let widened: Placed<8, f64, Pq<12, 2>> = x.convert();
    let r = widened + &y;
    assert_eq!(bounds_of(&r), (8, 6));
    assert_eq!(r.get_or(999.0), 3.0);
}

#[test]
fn test_fold_over_neighbours() {
    let x: Placed<8, f64, Pq<12, 2>> =
        make_placed(DeviceId::range(1, 3), vec![2.0, 4.0, 6.0, 8.0]).unwrap();
    let domain = DeviceId::range(0, 2);

    let inclusive = fold_hood(|a, b| a + b, &x, &domain);
    assert_eq!(inclusive.get_or(999.0), 12.0);

    let exclusive = fold_hood_except(|a, b| a + b, &x, 5.0, &domain, DeviceId(2));
    assert_eq!(exclusive.get_or(999.0), 11.0);
}

#[test]
fn test_get_or_picks_present_operand() {
    let first: Placed<8, i32, Pq<4, 0>> = Placed::absent();
    let second: Placed<8, i32, Pq<8, 2>> = Placed::new(42);
    let r = get_or((first, second));
    assert_eq!(bounds_of(&r), (12, 2));
    assert_eq!(r.get_or(0), 42);
}

#[test]
fn test_neighbourhood_round() {
    let mut hood = Neighborhood::new(10_i32);
    hood.receive(DeviceId(7), 70)
        .receive(DeviceId(3), 30)
        .receive(DeviceId(7), 71);

    let x: Placed<4, i32, Pq<6, 4>> = hood.into_placed();
    assert_eq!(x.get().ids(), &[DeviceId(3), DeviceId(7)]);

    let doubled = ops::mul::<&Placed<4, i32, Pq<6, 4>>, i32>(&x, 2_i32);
    assert_eq!(doubled.get().values(), &[60, 142]);
    assert_eq!(*doubled.get().self_value(), 20);

    let total = fold_hood(|a, b| a + b, &doubled, &[DeviceId(3), DeviceId(7)]);
    assert_eq!(total.get_or(0), 202);
}

#[test]
fn test_malformed_neighbour_data() {
    let err = make_placed::<8, i32, Pq<8, 8>>(DeviceId::range(1, 2), vec![1]).unwrap_err();
    assert_eq!(err, FieldError::LengthMismatch { ids: 2, values: 1 });
}

#[test]
fn test_wire_exchange_between_devices() {
    // sender and receiver run the tier-8 instantiation
    let sent: Placed<8, u16, Pq<8, 8>> =
        make_placed(DeviceId::range(1, 3), vec![100_u16, 1, 2, 3]).unwrap();
    let bytes = wire::encode(&sent).unwrap();
    let received: Placed<8, u16, Pq<8, 8>> = wire::decode(&bytes).unwrap();
    assert_eq!(received, sent);

    // a tier-4 device never holds the value and exchanges nothing
    let silent: Placed<4, u16, Pq<8, 8>> = Placed::new(100);
    assert!(wire::encode(&silent).unwrap().is_empty());
}

struct Program;

impl TierVisitor for Program {
    type Output = Option<f64>;

    fn visit<const TIER: Tier>(self) -> Option<f64> {
        let speed: Placed<TIER, f64, Pq<6, 0>> = Placed::new(1.5);
        let doubled = &speed * 2.0_f64;
        doubled.local().copied()
    }
}

#[test]
fn test_program_dispatch() {
    assert_eq!(dispatch_tier(TierBit::new(2).unwrap(), Program), Some(3.0));
    assert_eq!(dispatch_tier(TierBit::new(4).unwrap(), Program), Some(3.0));
    assert_eq!(dispatch_tier(TierBit::new(8).unwrap(), Program), None);

    let config = TierConfig::new(4);
    assert_eq!(run_for_tier(&config, Some(2), Program).unwrap(), Some(3.0));
    assert!(run_for_tier(&config, Some(16), Program).is_err());
}

#[test]
fn test_field_display() {
    let f: Field<i32> = fieldcalc_core::make_field(vec![DeviceId(1)], vec![0, 3]).unwrap();
    assert_eq!(f.to_string(), "{1:3, *:0}");

    let x: Placed<8, i32, Pq<12, 0>> = Placed::new(5);
    assert_eq!(x.to_string(), "5@12,0");
}
