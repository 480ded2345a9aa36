//! Reference links for manual follow-up.

use super::LinkGenerator;
use url::form_urlencoded;

const CYBERCHEF_MAGIC: &str = "https://gchq.github.io/CyberChef/#recipe=Magic(3,false,false,'')&input=";
const DCODE_IDENTIFIER: &str = "https://www.dcode.fr/cipher-identifier";

/// CyberChef Magic recipe with the artifact prefilled, plus the dCode
/// cipher identifier
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceLinks;

impl LinkGenerator for ReferenceLinks {
    fn links(&self, data: &[u8]) -> Vec<String> {
        let encoded: String = form_urlencoded::byte_serialize(data).collect();
        vec![
            format!("CyberChef (Magic): {}{}", CYBERCHEF_MAGIC, encoded),
            format!("dCode (Cipher Identifier): {}", DCODE_IDENTIFIER),
        ]
    }
}
