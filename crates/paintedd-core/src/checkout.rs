//! WhatsApp deep links for cart checkout and artwork inquiries.

use crate::models::{Artwork, Metadata, StockStatus};
use crate::session::Cart;
use crate::utils::digits_only;

const WA_ME: &str = "https://wa.me";

/// What a gallery visitor is asking about, decided by stock status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InquiryKind {
    PurchaseRequest,
    PrintInquiry,
    General,
}

impl From<StockStatus> for InquiryKind {
    fn from(status: StockStatus) -> Self {
        match status {
            StockStatus::Available => InquiryKind::PurchaseRequest,
            StockStatus::Sold => InquiryKind::PrintInquiry,
            StockStatus::Unlisted => InquiryKind::General,
        }
    }
}

impl InquiryKind {
    pub fn subject(&self) -> &'static str {
        match self {
            InquiryKind::PurchaseRequest => "Purchase Request",
            InquiryKind::PrintInquiry => "Inquire Print",
            InquiryKind::General => "General Inquiry",
        }
    }
}

/// `https://wa.me/{digits}?text={message}`
pub fn deep_link(number: &str, message: &str) -> String {
    format!("{}/{}?text={}", WA_ME, digits_only(number), urlencoding::encode(message))
}

/// Plain summary of every cart line and the total, `None` for an empty cart.
pub fn cart_message(cart: &Cart, meta: &Metadata) -> Option<String> {
    if cart.is_empty() {
        return None;
    }
    let cur = meta.currency();
    let header = format!(
        "Hello Paintedd, I'm interested in the following items from {}:",
        meta.event_name()
    );
    let lines = cart.items().iter().map(|item| {
        format!(
            "• {}\n  Specs: {}\n  Code: [{}]\n  Price: {} {}",
            item.title, item.details, item.sku, cur, item.price
        )
    });
    let footer = format!("Total Estimate: {} {}", cur, cart.total());

    let blocks: Vec<String> = std::iter::once(header).chain(lines).chain(std::iter::once(footer)).collect();
    Some(blocks.join("\n\n"))
}

pub fn cart_link(cart: &Cart, meta: &Metadata) -> Option<String> {
    cart_message(cart, meta).map(|msg| deep_link(meta.whatsapp_number(), &msg))
}

pub fn artwork_inquiry(artwork: &Artwork) -> String {
    format!("Hi, inquiring about \"{}\" (ID: {})", artwork.display_title(), artwork.id)
}

/// Gallery inquiry: subject line from stock status, then the artwork.
pub fn gallery_inquiry(artwork: &Artwork, status: StockStatus) -> String {
    format!(
        "{}\n{}",
        InquiryKind::from(status).subject(),
        artwork_inquiry(artwork)
    )
}

pub fn inquiry_link(number: &str, artwork: &Artwork, status: StockStatus) -> String {
    deep_link(number, &gallery_inquiry(artwork, status))
}
