//! Rule-based intent classification.
//!
//! One generic evaluation engine, multiple named rule tables. Rules are
//! checked in order and the first rule with any substring match wins, so
//! table order is the priority tie-break (order keywords before inquiry
//! keywords, etc). No rule matching is an outcome, not an error: the
//! message becomes `Unclassified` and must never be persisted downstream.

use ledgertap_protocol::{ClassifiedMessage, Intent, RawMessage};

/// One classification rule: an intent and the keywords that trigger it.
#[derive(Debug, Clone)]
pub struct Rule {
    pub intent: Intent,
    pub keywords: Vec<String>,
}

/// An ordered, immutable rule table.
///
/// Tables are plain values handed to the pipeline at construction - each
/// channel gets its own table, never shared mutable state.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Build a table from (intent, keywords) pairs, keeping their order.
    /// Keywords are matched case-insensitively (ASCII).
    pub fn new<I, K>(rules: I) -> Self
    where
        I: IntoIterator<Item = (Intent, K)>,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        let rules = rules
            .into_iter()
            .map(|(intent, keywords)| Rule {
                intent,
                keywords: keywords
                    .into_iter()
                    .map(|k| k.into().to_lowercase())
                    .collect(),
            })
            .collect();
        Self { rules }
    }

    /// Strict table for imports reviewed by hand: exact business-document
    /// keywords only, because a false positive costs an operator time.
    pub fn strict_import() -> Self {
        Self::new([
            (Intent::Order, vec!["발주서", "주문서"]),
            (Intent::Payment, vec!["입금액", "카드결제", "송금", "이체"]),
        ])
    }

    /// Broad table for opportunistic live monitoring, where completeness
    /// matters more than precision. Order and payment outrank the generic
    /// buckets; inquiry comes last since "?" matches almost anything.
    pub fn live_monitor() -> Self {
        Self::new([
            (Intent::Order, vec!["발주", "주문"]),
            (Intent::Payment, vec!["입금", "카드", "송금", "이체"]),
            (Intent::PriceNotice, vec!["단가", "가격"]),
            (Intent::DeliveryNotice, vec!["제작기간", "일정", "납기"]),
            (Intent::Complete, vec!["완료", "감사합니다", "확정"]),
            (Intent::Inquiry, vec!["문의", "?", "가능할까요", "언제"]),
        ])
    }

    /// Classify a text against this table.
    pub fn classify_text(&self, text: &str) -> Intent {
        let haystack = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| haystack.contains(k.as_str())))
            .map(|rule| rule.intent)
            .unwrap_or(Intent::Unclassified)
    }

    /// Attach an intent to a segmented message.
    pub fn classify(&self, raw: RawMessage) -> ClassifiedMessage {
        let intent = self.classify_text(&raw.text);
        ClassifiedMessage { raw, intent }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_rule_wins() {
        let table = RuleTable::live_monitor();
        // Contains both an order keyword and an inquiry keyword; order is
        // listed first and must win.
        assert_eq!(table.classify_text("발주 가능할까요?"), Intent::Order);
    }

    #[test]
    fn no_match_is_unclassified() {
        let table = RuleTable::live_monitor();
        assert_eq!(table.classify_text("안녕하세요"), Intent::Unclassified);
    }

    #[test]
    fn classification_is_deterministic() {
        let table = RuleTable::live_monitor();
        let text = "입금 완료했습니다";
        let first = table.classify_text(text);
        for _ in 0..10 {
            assert_eq!(table.classify_text(text), first);
        }
        assert_eq!(first, Intent::Payment);
    }

    #[test]
    fn strict_table_ignores_loose_phrasing() {
        let strict = RuleTable::strict_import();
        let broad = RuleTable::live_monitor();

        // "발주" alone is enough for live monitoring but not for the
        // strict import table, which wants the document word.
        assert_eq!(strict.classify_text("발주 부탁드립니다"), Intent::Unclassified);
        assert_eq!(broad.classify_text("발주 부탁드립니다"), Intent::Order);

        assert_eq!(strict.classify_text("발주서 보냈습니다"), Intent::Order);
        assert_eq!(strict.classify_text("입금액입니다"), Intent::Payment);
    }

    #[test]
    fn ascii_keywords_match_case_insensitively() {
        let table = RuleTable::new([(Intent::Order, vec!["box"])]);
        assert_eq!(table.classify_text("3 BOX 주문이요"), Intent::Order);
    }

    #[test]
    fn question_mark_cue_reaches_inquiry() {
        let table = RuleTable::live_monitor();
        assert_eq!(table.classify_text("혹시 재고 있나요?"), Intent::Inquiry);
    }
}
