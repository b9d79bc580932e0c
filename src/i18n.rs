//! Display labels for the two product languages.

use crate::models::{Language, ReviewStatus, TypeTag};
use crate::review::IngestState;

pub fn type_label(tag: TypeTag, lang: Language) -> &'static str {
    match (lang, tag) {
        (Language::Ro, TypeTag::Invoice) => "Facturi Fiscale",
        (Language::Ro, TypeTag::Contract) => "Contracte",
        (Language::Ro, TypeTag::DeliveryNote) => "Avize de Însoțire",
        (Language::Ro, TypeTag::Check) => "Cecuri",
        (Language::Ro, TypeTag::Receipt) => "Bonuri Fiscale",
        (Language::Ro, TypeTag::CashReport) => "Rapoarte de Casă",
        (Language::Ro, TypeTag::BankStatement) => "Extrase Bancare",
        (Language::Ro, TypeTag::OfficialReport) => "Procese Verbale",
        (Language::Ro, TypeTag::Unknown) => "Necunoscut",
        (Language::Ru, TypeTag::Invoice) => "Налоговые накладные",
        (Language::Ru, TypeTag::Contract) => "Контракты",
        (Language::Ru, TypeTag::DeliveryNote) => "Накладные",
        (Language::Ru, TypeTag::Check) => "Чеки",
        (Language::Ru, TypeTag::Receipt) => "Кассовые чеки",
        (Language::Ru, TypeTag::CashReport) => "Кассовые отчеты",
        (Language::Ru, TypeTag::BankStatement) => "Банковские выписки",
        (Language::Ru, TypeTag::OfficialReport) => "Акты",
        (Language::Ru, TypeTag::Unknown) => "Неизвестный",
    }
}

pub fn status_label(status: ReviewStatus, lang: Language) -> &'static str {
    match (lang, status) {
        (Language::Ro, ReviewStatus::Pending) => "Așteptare",
        (Language::Ro, ReviewStatus::Validated) => "Validat",
        (Language::Ro, ReviewStatus::Archived) => "Arhivat",
        (Language::Ru, ReviewStatus::Pending) => "Ожидает",
        (Language::Ru, ReviewStatus::Validated) => "Проверено",
        (Language::Ru, ReviewStatus::Archived) => "Архивировано",
    }
}

pub fn ingest_label(state: IngestState, lang: Language) -> &'static str {
    match (lang, state) {
        (Language::Ro, IngestState::Processing) => "Procesare...",
        (Language::Ro, IngestState::Done) => "Succes",
        (Language::Ru, IngestState::Processing) => "Обработка...",
        (Language::Ru, IngestState::Done) => "Успешно",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tag_has_distinct_labels_per_language() {
        for lang in Language::ALL {
            let mut labels: Vec<_> = TypeTag::ALL.iter().map(|t| type_label(*t, *lang)).collect();
            labels.sort_unstable();
            labels.dedup();
            assert_eq!(labels.len(), TypeTag::ALL.len(), "duplicate label in {lang}");
        }
    }

    #[test]
    fn romanian_labels() {
        assert_eq!(type_label(TypeTag::Invoice, Language::Ro), "Facturi Fiscale");
        assert_eq!(status_label(ReviewStatus::Validated, Language::Ro), "Validat");
        assert_eq!(ingest_label(IngestState::Processing, Language::Ro), "Procesare...");
    }

    #[test]
    fn russian_labels() {
        assert_eq!(type_label(TypeTag::Unknown, Language::Ru), "Неизвестный");
        assert_eq!(status_label(ReviewStatus::Pending, Language::Ru), "Ожидает");
        assert_eq!(ingest_label(IngestState::Done, Language::Ru), "Успешно");
    }
}
