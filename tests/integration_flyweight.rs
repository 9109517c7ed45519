use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::info;

use pattyrn::flyweight::{Flyweight, FlyweightConfig, InstanceCache, KeyMode, Signature};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pattyrn=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

#[derive(Debug)]
struct Point {
    x: i32,
    y: i32,
}

static POINTS_BUILT: AtomicUsize = AtomicUsize::new(0);

impl Flyweight for Point {
    type Error = anyhow::Error;

    fn construct(signature: &Signature) -> Result<Self> {
        POINTS_BUILT.fetch_add(1, Ordering::SeqCst);
        let coord = |i: usize| -> Result<i32> {
            let arg = signature.get(i).ok_or_else(|| anyhow!("Point needs two coordinates"))?;
            Ok(arg.as_str().parse()?)
        };
        Ok(Point { x: coord(0)?, y: coord(1)? })
    }
}

#[derive(Debug)]
struct Card {
    suit: String,
    value: u8,
}

impl Flyweight for Card {
    type Error = anyhow::Error;

    fn construct(signature: &Signature) -> Result<Self> {
        let suit = signature
            .get_kwarg("suit")
            .or_else(|| signature.get(0))
            .ok_or_else(|| anyhow!("missing suit"))?;
        let value = signature
            .get_kwarg("value")
            .or_else(|| signature.get(1))
            .ok_or_else(|| anyhow!("missing value"))?;
        Ok(Card {
            suit: suit.to_string(),
            value: value.as_str().parse()?,
        })
    }
}

#[test]
fn test_points_share_instances() {
    init_tracing();
    let points = InstanceCache::<Point>::for_type(FlyweightConfig::default());

    let a = points.instance(&Signature::new().arg(3).arg(4)).unwrap();
    let b = points.instance(&Signature::new().arg(3).arg(4)).unwrap();
    let c = points.instance(&Signature::new().arg(3).arg(5)).unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!((c.x, c.y), (3, 5));
    assert_eq!(points.family(), "Point");
    info!("Point cache metrics: {:?}", points.metrics());
}

#[test]
fn test_identity_follows_string_form() {
    let points = InstanceCache::<Point>::with_defaults("Point");

    for x in -3..3 {
        for y in -3..3 {
            let first = points.instance(&Signature::new().arg(x).arg(y)).unwrap();
            let as_text = points
                .instance(&Signature::new().arg(x.to_string()).arg(y.to_string()))
                .unwrap();
            assert!(Arc::ptr_eq(&first, &as_text));

            let shifted = points.instance(&Signature::new().arg(x).arg(y + 10)).unwrap();
            assert!(!Arc::ptr_eq(&first, &shifted));
        }
    }
}

#[test]
fn test_constructor_runs_once_per_signature() {
    let points = InstanceCache::<Point>::with_defaults("Point");
    let sig = Signature::new().arg(40).arg(2);

    for _ in 0..10 {
        points.instance(&sig).unwrap();
    }

    assert_eq!(points.len(), 1);
    assert_eq!(points.metrics().misses, 1);
    assert_eq!(points.metrics().hits, 9);
    assert!(POINTS_BUILT.load(Ordering::SeqCst) >= 1);
}

#[test]
fn test_keyword_order_matters_only_in_display_mode() {
    let display = InstanceCache::<Card>::with_defaults("Card");
    let tagged = InstanceCache::<Card>::new("Card", FlyweightConfig::with_key_mode(KeyMode::Tagged));

    let a = Signature::new().kwarg("suit", "Spade").kwarg("value", 3);
    let b = Signature::new().kwarg("value", 3).kwarg("suit", "Spade");

    assert!(!Arc::ptr_eq(&display.instance(&a).unwrap(), &display.instance(&b).unwrap()));
    assert!(Arc::ptr_eq(&tagged.instance(&a).unwrap(), &tagged.instance(&b).unwrap()));

    let card = tagged.instance(&a).unwrap();
    assert_eq!(card.suit, "Spade");
    assert_eq!(card.value, 3);
}

#[test]
fn test_tagged_mode_avoids_cross_type_collisions() {
    let tagged = InstanceCache::<Card>::new("Card", FlyweightConfig::with_key_mode(KeyMode::Tagged));

    let numeric = tagged.instance(&Signature::new().arg("Heart").arg(1u8)).unwrap();
    let textual = tagged.instance(&Signature::new().arg("Heart").arg("1")).unwrap();

    assert!(!Arc::ptr_eq(&numeric, &textual));
    assert_eq!(tagged.len(), 2);
}

#[test]
fn test_construction_errors_propagate_and_are_not_cached() {
    let cards = InstanceCache::<Card>::with_defaults("Card");
    let sig = Signature::new().arg("Club").arg("queen");

    let err = cards.instance(&sig).unwrap_err();
    assert!(err.to_string().contains("invalid digit"));
    assert!(!cards.contains(&sig));

    let err = cards.instance(&Signature::new()).unwrap_err();
    assert_eq!(err.to_string(), "missing suit");
    assert!(cards.is_empty());
    assert_eq!(cards.metrics().failed_constructions, 2);
}

#[test]
fn test_families_do_not_share_keys() {
    let spades = InstanceCache::<Card>::with_defaults("Card");
    let other_deck = InstanceCache::<Card>::with_defaults("TarotCard");
    let sig = Signature::new().arg("Spade").arg(1);

    assert_ne!(spades.key_for(&sig), other_deck.key_for(&sig));
    assert_eq!(spades.key_for(&sig).as_str(), "Spade1{}Card");
}

#[test]
fn test_keyword_values_keep_their_string_form() {
    let cards = InstanceCache::<Card>::with_defaults("Card");

    let numeric = cards.instance(&Signature::new().arg("Heart").kwarg("value", 1u8)).unwrap();
    let textual = cards.instance(&Signature::new().arg("Heart").kwarg("value", "1")).unwrap();
    assert!(!Arc::ptr_eq(&numeric, &textual));

    // A string value cannot pose as two keyword arguments
    let packed = Signature::new().kwarg("suit", "Club, value: 2");
    let split = Signature::new().kwarg("suit", "Club").kwarg("value", 2);
    assert_ne!(cards.key_for(&packed), cards.key_for(&split));
}
