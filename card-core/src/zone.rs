//! Interactive regions of the card texture.
//!
//! Zones live in texture UV space centred on the card: `x = u - 0.5`,
//! `y = v - 0.5`, with `v` growing upward. Every bound lies in `[-0.5, 0.5]`.

use serde::{Deserialize, Serialize};

use crate::layout::{CardLayout, PixelRect};
use crate::{CardView, ContactKind, LinkAction};

/// Normalized rectangle of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneBounds {
    /// Left edge.
    pub left: f32,
    /// Right edge.
    pub right: f32,
    /// Top edge (greater than `bottom`).
    pub top: f32,
    /// Bottom edge.
    pub bottom: f32,
}

impl ZoneBounds {
    /// Convert a texture pixel rectangle into centred UV bounds.
    #[must_use]
    pub fn from_pixels(rect: &PixelRect, width: u32, height: u32) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let (w, h) = (width as f32, height as f32);
        Self {
            left: rect.x / w - 0.5,
            right: rect.right() / w - 0.5,
            top: 0.5 - rect.y / h,
            bottom: 0.5 - rect.bottom() / h,
        }
    }

    /// Whether a centred point lies inside (edges inclusive).
    #[must_use]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x <= self.right && y >= self.bottom && y <= self.top
    }

    /// Whether two bounds share any area.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.bottom < other.top
            && other.bottom < self.top
    }
}

/// A clickable contact region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractiveZone {
    /// Contact kind.
    pub kind: ContactKind,
    /// Raw contact value.
    pub value: String,
    /// Region on the card.
    pub bounds: ZoneBounds,
}

impl InteractiveZone {
    /// The action a hit on this zone queues.
    #[must_use]
    pub fn action(&self) -> LinkAction {
        LinkAction::new(self.kind, &self.value)
    }
}

/// Derive zones from an existing layout, in drawing order.
#[must_use]
pub fn zones_from_layout(layout: &CardLayout) -> Vec<InteractiveZone> {
    layout
        .contacts
        .iter()
        .map(|contact| InteractiveZone {
            kind: contact.kind,
            value: contact.value.clone(),
            bounds: ZoneBounds::from_pixels(&contact.hit_rect, layout.width, layout.height),
        })
        .collect()
}

/// Derive zones for a card.
#[must_use]
pub fn zones_for(card: &CardView) -> Vec<InteractiveZone> {
    zones_from_layout(&CardLayout::for_card(card))
}

/// Find the first zone containing a texture UV coordinate (`u`, `v` in `[0, 1]`,
/// `v` up).
#[must_use]
pub fn resolve(zones: &[InteractiveZone], u: f32, v: f32) -> Option<&InteractiveZone> {
    let (x, y) = (u - 0.5, v - 0.5);
    zones.iter().find(|zone| zone.bounds.contains(x, y))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn full_card() -> CardView {
        CardView {
            phone: "+1 555 0100".into(),
            email: "jane@acme.example".into(),
            website: "acme.example".into(),
            ..CardView::default()
        }
    }

    #[test]
    fn test_one_zone_per_populated_contact() {
        let zones = zones_for(&full_card());
        let kinds: Vec<_> = zones.iter().map(|z| z.kind).collect();
        assert_eq!(
            kinds,
            vec![ContactKind::Phone, ContactKind::Email, ContactKind::Website]
        );

        let email_only = CardView {
            email: "jane@acme.example".into(),
            ..CardView::default()
        };
        let zones = zones_for(&email_only);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].kind, ContactKind::Email);
        assert_eq!(zones[0].value, "jane@acme.example");
    }

    #[test]
    fn test_empty_card_has_no_zones() {
        assert!(zones_for(&CardView::default()).is_empty());
    }

    #[test]
    fn test_resolve_zone_centre() {
        let zones = zones_for(&full_card());
        let email = &zones[1].bounds;
        let u = (email.left + email.right) / 2.0 + 0.5;
        let v = (email.top + email.bottom) / 2.0 + 0.5;

        let hit = resolve(&zones, u, v).expect("centre must hit");
        assert_eq!(hit.action(), LinkAction::Email("jane@acme.example".into()));
    }

    #[test]
    fn test_resolve_header_area_misses() {
        let zones = zones_for(&full_card());
        // Logo corner, top-left of the card.
        assert!(resolve(&zones, 0.1, 0.9).is_none());
    }

    #[test]
    fn test_zones_from_layout_matches_zones_for() {
        let card = full_card();
        let layout = CardLayout::for_card(&card);
        assert_eq!(zones_from_layout(&layout), zones_for(&card));
    }

    fn contact_value() -> impl Strategy<Value = String> {
        prop_oneof![Just(String::new()), "[a-z0-9@.+ ]{1,120}"]
    }

    proptest! {
        #[test]
        fn prop_zone_count_and_order(
            phone in contact_value(),
            email in contact_value(),
            website in contact_value(),
        ) {
            let card = CardView { phone, email, website, ..CardView::default() };
            let zones = zones_for(&card);

            let expected: Vec<_> = card.contacts().map(|(kind, _)| kind).collect();
            let kinds: Vec<_> = zones.iter().map(|z| z.kind).collect();
            prop_assert_eq!(kinds, expected);
        }

        #[test]
        fn prop_zones_in_range_and_disjoint(
            phone in contact_value(),
            email in contact_value(),
            website in contact_value(),
        ) {
            let card = CardView { phone, email, website, ..CardView::default() };
            let zones = zones_for(&card);

            for zone in &zones {
                let b = zone.bounds;
                for edge in [b.left, b.right, b.top, b.bottom] {
                    prop_assert!((-0.5..=0.5).contains(&edge));
                }
                prop_assert!(b.left < b.right);
                prop_assert!(b.bottom < b.top);
            }
            for (i, a) in zones.iter().enumerate() {
                for b in zones.iter().skip(i + 1) {
                    prop_assert!(!a.bounds.overlaps(&b.bounds));
                }
            }
        }
    }
}
