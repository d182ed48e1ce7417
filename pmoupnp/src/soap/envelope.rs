//! Structures de l'enveloppe SOAP

use std::collections::BTreeMap;

use xmltree::{Element, XMLNode};

/// Valeurs de retour d'une action, indexées par nom d'argument
pub type FieldMap = BTreeMap<String, String>;

/// Enveloppe SOAP complète
#[derive(Debug, Clone)]
pub struct SoapEnvelope {
    /// En-tête SOAP optionnel
    pub header: Option<SoapHeader>,

    /// Corps SOAP contenant l'action ou la réponse
    pub body: SoapBody,
}

/// En-tête SOAP
#[derive(Debug, Clone)]
pub struct SoapHeader {
    /// Contenu XML brut de l'en-tête
    pub content: Element,
}

/// Corps SOAP
#[derive(Debug, Clone)]
pub struct SoapBody {
    /// Contenu XML brut du corps
    pub content: Element,
}

impl SoapEnvelope {
    /// Crée une nouvelle enveloppe SOAP
    pub fn new(body: SoapBody) -> Self {
        Self { header: None, body }
    }

    /// Élément `<u:{action}Response>` du corps, s'il existe
    pub fn response(&self, action: &str) -> Option<&Element> {
        let expected = format!("{}Response", action);
        find_child_with_suffix(&self.body.content, &expected)
    }

    /// Arguments de sortie de `<u:{action}Response>`, texte trimé.
    ///
    /// Les arguments vides sont conservés avec une valeur vide.
    pub fn response_fields(&self, action: &str) -> Option<FieldMap> {
        let response = self.response(action)?;
        let fields = response
            .children
            .iter()
            .filter_map(XMLNode::as_element)
            .map(|elem| {
                let text = elem
                    .get_text()
                    .map(|t| t.trim().to_string())
                    .unwrap_or_default();
                (elem.name.clone(), text)
            })
            .collect();
        Some(fields)
    }
}

/// Premier enfant direct dont le nom (local) se termine par `suffix`
pub fn find_child_with_suffix<'a>(parent: &'a Element, suffix: &str) -> Option<&'a Element> {
    parent.children.iter().find_map(|node| match node {
        XMLNode::Element(elem) if elem.name.ends_with(suffix) => Some(elem),
        _ => None,
    })
}
