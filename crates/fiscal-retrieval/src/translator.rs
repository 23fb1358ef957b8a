//! Heuristic Russian/Ukrainian/English to Spanish term substitution.
//!
//! Only the lexical arm of a hybrid query sees the translated text; embeddings
//! are computed from the original query, since the embedding models are
//! multilingual.

use std::collections::HashMap;

/// Longest phrase, in words, in the term table.
const MAX_PHRASE_WORDS: usize = 3;

const ENGLISH_MARKERS: &[&str] = &[
    "tax", "taxes", "vat", "income", "return", "deadline", "deadlines", "self-employed", "freelancer",
    "invoice", "refund", "deduction", "penalty", "quarterly", "residency", "filing", "due",
];

const TERMS: &[(&str, &str)] = &[
    // Russian
    ("налог", "impuesto"),
    ("налоги", "impuestos"),
    ("налога", "impuesto"),
    ("налогов", "impuestos"),
    ("ндс", "iva"),
    ("ндфл", "irpf"),
    ("подоходный налог", "irpf"),
    ("налог на прибыль", "impuesto sobre sociedades"),
    ("налог на имущество", "impuesto sobre el patrimonio"),
    ("декларация", "declaración"),
    ("декларацию", "declaración"),
    ("декларации", "declaración"),
    ("налоговая декларация", "declaración de la renta"),
    ("срок", "plazo"),
    ("сроки", "plazos"),
    ("крайний срок", "fecha límite"),
    ("автономо", "autónomo"),
    ("самозанятый", "autónomo"),
    ("фрилансер", "autónomo"),
    ("квартал", "trimestre"),
    ("квартальный", "trimestral"),
    ("ежеквартальный", "trimestral"),
    ("годовой", "anual"),
    ("счет", "factura"),
    ("счёт", "factura"),
    ("счет-фактура", "factura"),
    ("фактура", "factura"),
    ("возврат", "devolución"),
    ("вычет", "deducción"),
    ("вычеты", "deducciones"),
    ("льгота", "bonificación"),
    ("штраф", "sanción"),
    ("штрафы", "sanciones"),
    ("резидент", "residente"),
    ("нерезидент", "no residente"),
    ("налоговое резидентство", "residencia fiscal"),
    ("резидентство", "residencia fiscal"),
    ("компания", "sociedad"),
    ("социальные взносы", "cotizaciones"),
    ("взносы", "cotizaciones"),
    ("пенсия", "pensión"),
    ("зарплата", "salario"),
    ("доход", "ingresos"),
    ("доходы", "ingresos"),
    ("расходы", "gastos"),
    ("наследство", "sucesiones"),
    ("дарение", "donaciones"),
    ("недвижимость", "inmueble"),
    ("аренда", "alquiler"),
    ("ипотека", "hipoteca"),
    ("налоговая", "hacienda"),
    ("налоговая служба", "agencia tributaria"),
    ("модель", "modelo"),
    ("форма", "modelo"),
    ("регистрация", "alta"),
    ("электронная подпись", "certificado digital"),
    ("цифровая подпись", "certificado digital"),
    // Ukrainian
    ("податок", "impuesto"),
    ("податки", "impuestos"),
    ("пдв", "iva"),
    ("пдфо", "irpf"),
    ("декларація", "declaración"),
    ("строк", "plazo"),
    ("терміни", "plazos"),
    ("рахунок", "factura"),
    ("повернення", "devolución"),
    ("відрахування", "deducción"),
    ("доходи", "ingresos"),
    ("витрати", "gastos"),
    ("оренда", "alquiler"),
    ("нерухомість", "inmueble"),
    ("спадщина", "sucesiones"),
    ("самозайнятий", "autónomo"),
    ("внески", "cotizaciones"),
    ("податкова", "hacienda"),
    // English
    ("tax", "impuesto"),
    ("taxes", "impuestos"),
    ("vat", "iva"),
    ("income tax", "irpf"),
    ("personal income tax", "irpf"),
    ("corporate tax", "impuesto sobre sociedades"),
    ("wealth tax", "impuesto sobre el patrimonio"),
    ("tax return", "declaración de la renta"),
    ("return", "declaración"),
    ("declaration", "declaración"),
    ("deadline", "plazo"),
    ("deadlines", "plazos"),
    ("due date", "fecha límite"),
    ("self-employed", "autónomo"),
    ("freelancer", "autónomo"),
    ("quarterly", "trimestral"),
    ("quarter", "trimestre"),
    ("annual", "anual"),
    ("invoice", "factura"),
    ("invoices", "facturas"),
    ("refund", "devolución"),
    ("deduction", "deducción"),
    ("deductions", "deducciones"),
    ("penalty", "sanción"),
    ("fine", "multa"),
    ("resident", "residente"),
    ("non-resident", "no residente"),
    ("tax residency", "residencia fiscal"),
    ("company", "sociedad"),
    ("social security", "seguridad social"),
    ("contributions", "cotizaciones"),
    ("income", "ingresos"),
    ("expenses", "gastos"),
    ("inheritance", "sucesiones"),
    ("gift", "donaciones"),
    ("property", "inmueble"),
    ("rent", "alquiler"),
    ("rental", "alquiler"),
    ("mortgage", "hipoteca"),
    ("tax agency", "agencia tributaria"),
    ("form", "modelo"),
    ("digital certificate", "certificado digital"),
    ("registration", "alta"),
    ("withholding", "retención"),
];

pub struct QueryTranslator {
    terms: HashMap<&'static str, &'static str>,
}

impl Default for QueryTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryTranslator {
    pub fn new() -> Self {
        Self { terms: TERMS.iter().copied().collect() }
    }

    /// Translate known tax terms to Spanish, or return `text` unchanged when it
    /// is neither Cyrillic nor recognisably English tax vocabulary.
    pub fn translate(&self, text: &str) -> String {
        let lower = text.to_lowercase();
        let words = word_spans(&lower);
        if !needs_translation(&lower, &words) {
            return text.to_string();
        }

        let mut out = String::with_capacity(lower.len());
        let mut cursor = 0;
        let mut i = 0;
        while i < words.len() {
            let longest = MAX_PHRASE_WORDS.min(words.len() - i);
            let matched = (1..=longest).rev().find_map(|n| {
                let phrase = words[i..i + n].iter().map(|&(s, e)| &lower[s..e]).collect::<Vec<_>>().join(" ");
                self.terms.get(phrase.as_str()).map(|es| (n, *es))
            });
            match matched {
                Some((n, spanish)) => {
                    out.push_str(&lower[cursor..words[i].0]);
                    out.push_str(spanish);
                    cursor = words[i + n - 1].1;
                    i += n;
                }
                None => i += 1,
            }
        }
        out.push_str(&lower[cursor..]);
        out
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-'
}

/// Byte ranges of the words in `text`.
fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (idx, c) in text.char_indices() {
        match (is_word_char(c), start) {
            (true, None) => start = Some(idx),
            (false, Some(s)) => {
                spans.push((s, idx));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

fn needs_translation(lower: &str, words: &[(usize, usize)]) -> bool {
    let cyrillic = lower.chars().any(|c| ('\u{0400}'..='\u{04FF}').contains(&c));
    cyrillic || words.iter().any(|&(s, e)| ENGLISH_MARKERS.contains(&&lower[s..e]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spanish_text_is_returned_unchanged() {
        let t = QueryTranslator::new();
        assert_eq!(t.translate("Modelo 303 IVA trimestral"), "Modelo 303 IVA trimestral");
        assert_eq!(t.translate(""), "");
    }

    #[test]
    fn russian_terms_are_substituted() {
        let t = QueryTranslator::new();
        assert_eq!(t.translate("Когда платить НДС?"), "когда платить iva?");
        assert_eq!(t.translate("подоходный налог за квартал"), "irpf за trimestre");
    }

    #[test]
    fn ukrainian_terms_are_substituted() {
        let t = QueryTranslator::new();
        assert_eq!(t.translate("ПДВ декларація"), "iva declaración");
    }

    #[test]
    fn english_phrases_prefer_the_longest_match() {
        let t = QueryTranslator::new();
        assert_eq!(t.translate("Tax return deadline for self-employed"), "declaración de la renta plazo for autónomo");
        assert_eq!(t.translate("personal income tax"), "irpf");
    }

    #[test]
    fn english_without_markers_is_untouched() {
        let t = QueryTranslator::new();
        assert_eq!(t.translate("Property in Madrid"), "Property in Madrid");
    }
}
