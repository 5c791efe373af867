//! Normalizer, comparator and syntax checker definitions.
//!
//! These are the extensible functional objects of the schema: each is
//! identified by an OID and carries an implementation reference - a
//! fully-qualified class or functor name plus an optional Base64 bytecode
//! blob, the `M-FQCN` / `M-BYTECODE` extensions of the subschema form.
//! The engine tracks presence and identity only; materializing them into
//! callable functions is the host environment's concern.

use super::{SchemaObject, SchemaObjectKind};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

macro_rules! functional_object {
    ($(#[$doc:meta])* $name:ident, $kind:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            pub oid: String,
            #[serde(default)]
            pub names: Vec<String>,
            #[serde(default)]
            pub description: String,
            #[serde(default)]
            pub obsolete: bool,
            /// Fully-qualified name of the implementation (`M-FQCN`).
            pub fqcn: String,
            /// Base64 bytecode blob (`M-BYTECODE`), when the implementation
            /// is shipped inside the schema rather than on the host.
            #[serde(default)]
            pub bytecode: Option<String>,
            #[serde(default)]
            pub schema_name: String,
        }

        impl $name {
            pub fn new(oid: impl Into<String>, fqcn: impl Into<String>) -> Self {
                Self {
                    oid: oid.into(),
                    names: Vec::new(),
                    description: String::new(),
                    obsolete: false,
                    fqcn: fqcn.into(),
                    bytecode: None,
                    schema_name: String::new(),
                }
            }

            /// Decodes the `M-BYTECODE` payload, if any.
            pub fn bytecode_bytes(&self) -> Result<Option<Vec<u8>>, base64::DecodeError> {
                match &self.bytecode {
                    Some(blob) => BASE64.decode(blob.as_bytes()).map(Some),
                    None => Ok(None),
                }
            }
        }

        impl SchemaObject for $name {
            const KIND: SchemaObjectKind = $kind;

            fn oid(&self) -> &str {
                &self.oid
            }

            fn names(&self) -> &[String] {
                &self.names
            }

            fn schema_name(&self) -> &str {
                &self.schema_name
            }

            fn is_obsolete(&self) -> bool {
                self.obsolete
            }

            fn references(&self) -> Vec<(SchemaObjectKind, String)> {
                Vec::new()
            }
        }
    };
}

functional_object!(
    /// A value normalizer bound to a matching rule.
    Normalizer,
    SchemaObjectKind::Normalizer
);

functional_object!(
    /// A value comparator bound to a matching rule.
    Comparator,
    SchemaObjectKind::Comparator
);

functional_object!(
    /// A value-space checker bound to a syntax.
    SyntaxChecker,
    SchemaObjectKind::SyntaxChecker
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytecode_round_trip() {
        let mut normalizer = Normalizer::new("2.5.13.2", "dirserver.normalizers.CaseIgnore");
        assert_eq!(normalizer.bytecode_bytes().unwrap(), None);

        normalizer.bytecode = Some(BASE64.encode(b"\xca\xfe\xba\xbe"));
        assert_eq!(
            normalizer.bytecode_bytes().unwrap(),
            Some(vec![0xca, 0xfe, 0xba, 0xbe])
        );

        normalizer.bytecode = Some("not base64 !!".to_string());
        assert!(normalizer.bytecode_bytes().is_err());
    }
}
