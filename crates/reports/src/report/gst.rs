//! Client-side GST computation and receipts.
//!
//! The backend sends its own `total_gst`/`cgst`/`sgst`; the figures here are
//! recomputed per line so a receipt can be checked against them.

use rust_decimal::Decimal;

use canteen_core::round_currency;

use crate::backend::Order;

/// Largest per-figure difference from the backend's GST still considered a match.
pub const RECONCILE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// GST on one line item. CGST and SGST are equal halves of the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GstBreakdown {
    pub item_total: Decimal,
    pub gst: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub total_with_gst: Decimal,
}

impl GstBreakdown {
    #[must_use]
    pub fn compute(price: Decimal, quantity: u32, rate: Decimal) -> Self {
        let item_total = price * Decimal::from(quantity);
        let gst = round_currency(item_total * rate);
        let half = gst / Decimal::TWO;
        Self {
            item_total,
            gst,
            cgst: half,
            sgst: half,
            total_with_gst: item_total + gst,
        }
    }
}

/// One receipt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: u32,
    pub price: Decimal,
    pub breakdown: GstBreakdown,
}

/// A printable receipt for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub token: String,
    pub lines: Vec<ReceiptLine>,
    pub subtotal: Decimal,
    pub total_gst: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub round_off: Decimal,
    /// Subtotal plus GST plus round-off, rounded to paise.
    pub total_payable: Decimal,
}

impl Receipt {
    #[must_use]
    pub fn for_order(order: &Order, rate: Decimal) -> Self {
        let lines: Vec<ReceiptLine> = order
            .order_details
            .iter()
            .map(|line| ReceiptLine {
                name: line.name.clone(),
                quantity: line.quantity,
                price: line.price,
                breakdown: GstBreakdown::compute(line.price, line.quantity, rate),
            })
            .collect();

        let subtotal: Decimal = lines.iter().map(|l| l.breakdown.item_total).sum();
        let total_gst: Decimal = lines.iter().map(|l| l.breakdown.gst).sum();
        let cgst: Decimal = lines.iter().map(|l| l.breakdown.cgst).sum();
        let sgst: Decimal = lines.iter().map(|l| l.breakdown.sgst).sum();
        let round_off = order.round_off.unwrap_or_default();

        Self {
            token: order.token_number.clone(),
            lines,
            subtotal,
            total_gst,
            cgst,
            sgst,
            round_off,
            total_payable: round_currency(subtotal + total_gst + round_off),
        }
    }

    /// Whether the recomputed GST matches the backend's figures within
    /// `tolerance`. Figures the backend did not send are not compared.
    #[must_use]
    pub fn reconciles_with_backend(&self, order: &Order, tolerance: Decimal) -> bool {
        let close = |ours: Decimal, theirs: Option<Decimal>| {
            theirs.is_none_or(|theirs| (ours - theirs).abs() <= tolerance)
        };
        close(self.total_gst, order.total_gst)
            && close(self.cgst, order.cgst)
            && close(self.sgst, order.sgst)
    }
}
