//! # Property-Based Tests
//!
//! Determinism and reconciliation invariants checked with proptest.

use grocer_core::primitives::{MAX_LINE_QUANTITY, VARIANT_SEPARATOR};
use grocer_core::{
    CatalogIndex, LineParser, MatchResult, MatchTier, Matcher, Order, Price, Product, ProductId,
    ReconcileMode, Reconciler, RequestedItem, VariantKey,
};
use proptest::collection::{btree_set, vec};
use proptest::prelude::*;

fn catalog_from_names(names: &[String]) -> CatalogIndex {
    CatalogIndex::build(
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Product::new(format!("p{i:03}"), name.clone(), Price(100 + i as u64))),
    )
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// One requested item per non-blank line, in input order.
    #[test]
    fn parse_yields_one_item_per_nonblank_line(
        lines in vec(prop_oneof![
            3 => "[a-z]{1,10}( [a-z]{1,10}){0,3}",
            1 => Just(String::new()),
            1 => Just("   ".to_string()),
        ], 1..60)
    ) {
        let text = lines.join("\n");
        let items = LineParser::parse(&text).to_vec();
        let expected: Vec<&str> = lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty()).collect();

        prop_assert_eq!(items.len(), expected.len());
        for (item, line) in items.iter().zip(&expected) {
            prop_assert_eq!(item.raw.as_str(), *line);
            prop_assert_eq!(item.quantity, 1);
        }
    }

    /// Every pass over the parsed view sees the same items.
    #[test]
    fn parse_is_restartable(text in "[a-z0-9 \n]{0,200}") {
        let items = LineParser::parse(&text);
        prop_assert_eq!(items.to_vec(), items.iter().collect::<Vec<_>>());
    }

    /// Leading quantities are always clamped into the valid range.
    #[test]
    fn leading_quantity_is_clamped(n in any::<u64>()) {
        let item = LineParser::parse_line(&format!("{n} eggs")).expect("item");
        prop_assert!(item.quantity >= 1);
        prop_assert!(item.quantity <= MAX_LINE_QUANTITY);
        prop_assert_eq!(item.description.as_str(), "eggs");
    }

    /// A description equal to a product name (any case) is a tier-1 match
    /// for exactly that product.
    #[test]
    fn exact_name_is_tier_one(
        names in btree_set("[a-z]{3,10}( [a-z]{3,10}){0,2}", 1..20),
        pick in any::<prop::sample::Index>(),
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let index = catalog_from_names(&names);
        let chosen = pick.index(names.len());

        let item = RequestedItem::new(names[chosen].to_uppercase(), 1);
        match Matcher::new(&index).match_item(&item) {
            MatchResult::Matched { product, tier, .. } => {
                prop_assert_eq!(tier, MatchTier::Exact);
                prop_assert_eq!(product.id, ProductId::new(format!("p{chosen:03}")));
            }
            MatchResult::Unmatched { .. } => prop_assert!(false, "exact name went unmatched"),
        }
    }

    /// Identical variant keys in one replace pass collapse into one summed line.
    #[test]
    fn replace_sums_identical_keys(
        first in 1u32..1000,
        second in 1u32..1000,
        noise in vec("[a-z]{3,8}", 0..5),
    ) {
        let product = Product::new("p001", "Organic Avocado", Price(199));
        let mut results = vec![MatchResult::matched(product.clone(), first, None, MatchTier::Exact)];
        results.extend(noise.iter().map(MatchResult::unmatched));
        results.push(MatchResult::matched(product, second, None, MatchTier::Contains));

        let order = Reconciler::reconcile(&Order::new(), &results, ReconcileMode::Replace);
        prop_assert_eq!(order.line_count(), 1);
        prop_assert_eq!(order.lines()[0].quantity, first + second);
    }

    /// Replacing twice with the same results never accumulates.
    #[test]
    fn replace_is_idempotent(
        requests in vec("[a-z]{3,8}( [a-z]{3,8}){0,2}", 0..20),
    ) {
        let index = CatalogIndex::build(vec![
            Product::new("p001", "Organic Avocado", Price(199)).with_tags(["fruit"]),
            Product::new("p002", "Almond Milk", Price(349)),
            Product::new("p003", "Whole Wheat Bread", Price(399)),
        ]);
        let text = requests.join("\n");
        let results = Matcher::new(&index).match_items(&LineParser::parse(&text));

        let once = Reconciler::reconcile(&Order::new(), &results, ReconcileMode::Replace);
        let twice = Reconciler::reconcile(&once, &results, ReconcileMode::Replace);
        prop_assert_eq!(once, twice);
    }

    /// Adding one unit and decrementing it leaves an empty order.
    #[test]
    fn add_then_decrement_is_empty(
        id in "[a-z][a-z0-9]{0,8}",
        hint in proptest::option::of("[0-9]{1,3}(g|kg|ml|l)"),
    ) {
        let product = Product::new(id, "Thing", Price(1));
        let mut order = Order::new();
        let key = Reconciler::add_one(&mut order, &product, hint.as_deref());
        prop_assert!(Reconciler::decrement_one(&mut order, &key));
        prop_assert_eq!(order.line_count(), 0);
    }

    /// Distinct indexable products never share a variant key, whatever
    /// descriptor either one carries.
    #[test]
    fn variant_keys_never_collide_across_products(
        a in "[a-z0-9:]{1,6}",
        b in "[a-z0-9:]{1,6}",
        hint_a in proptest::option::of("[a-z0-9 :]{0,10}"),
        hint_b in proptest::option::of("[a-z0-9 :]{0,10}"),
    ) {
        prop_assume!(a != b);
        prop_assume!(!a.contains(VARIANT_SEPARATOR) && !b.contains(VARIANT_SEPARATOR));
        let ka = VariantKey::derive(&ProductId::new(a), hint_a.as_deref(), None);
        let kb = VariantKey::derive(&ProductId::new(b), hint_b.as_deref(), None);
        prop_assert_ne!(ka, kb);
    }

    /// Order total is the sum of price × quantity over all lines.
    #[test]
    fn total_matches_line_sum(quantities in vec(1u32..50, 1..10)) {
        let mut order = Order::new();
        let mut expected = 0u64;
        for (i, &q) in quantities.iter().enumerate() {
            let price = 100 + i as u64;
            let product = Product::new(format!("p{i}"), format!("Item {i}"), Price(price));
            let results = vec![MatchResult::matched(product, q, None, MatchTier::Exact)];
            order = Reconciler::reconcile(&order, &results, ReconcileMode::Merge);
            expected += price * u64::from(q);
        }
        prop_assert_eq!(order.total(), Price(expected));
    }
}
