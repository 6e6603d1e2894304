//! Message and link helpers for sending a receipt to the donor.

use url::form_urlencoded::byte_serialize;
use url::Url;

use crate::{Error, Result};

/// Country calling code prefixed to donor mobile numbers
pub const COUNTRY_CODE: &str = "91";

pub fn share_message(donor_name: &str) -> String {
    format!(
        "Dear {}, thank you for your donation. Please find the receipt attached.",
        donor_name.trim()
    )
}

/// WhatsApp click-to-chat link for the donor with the share message prefilled.
///
/// Everything but ASCII digits is dropped from `mobile`. Spaces in the
/// message are sent as `%20`.
pub fn whatsapp_link(mobile: &str, donor_name: &str) -> Result<Url> {
    let digits: String = mobile.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(Error::InvalidRecord(format!("mobile number '{}' has no digits", mobile)));
    }
    let mut link = Url::parse("https://wa.me/")
        .map_err(|e| Error::Other(format!("bad share base URL: {}", e)))?;
    link.set_path(&format!("{}{}", COUNTRY_CODE, digits));
    // form encoding escapes a literal '+', so every '+' left is a space
    let text: String = byte_serialize(share_message(donor_name).as_bytes()).collect();
    link.set_query(Some(&format!("text={}", text.replace('+', "%20"))));
    Ok(link)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_donor() {
        assert_eq!(
            share_message(" Asha "),
            "Dear Asha, thank you for your donation. Please find the receipt attached."
        );
    }

    #[test]
    fn link_strips_formatting() {
        let link = whatsapp_link("98450-12345 ", "Asha").unwrap();
        assert_eq!(link.host_str(), Some("wa.me"));
        assert_eq!(link.path(), "/919845012345");
        assert_eq!(
            link.as_str(),
            "https://wa.me/919845012345?text=Dear%20Asha%2C%20thank%20you%20for%20your%20donation.\
             %20Please%20find%20the%20receipt%20attached."
        );
        let text: Vec<(String, String)> = link.query_pairs().into_owned().collect();
        assert_eq!(text[0].0, "text");
        assert_eq!(text[0].1, share_message("Asha"));
    }

    #[test]
    fn plus_in_names_survives_encoding() {
        let link = whatsapp_link("9845012345", "A+B Trust").unwrap();
        assert!(link.as_str().contains("text=Dear%20A%2BB%20Trust%2C"));
        let text: Vec<(String, String)> = link.query_pairs().into_owned().collect();
        assert_eq!(text[0].1, share_message("A+B Trust"));
    }

    #[test]
    fn empty_mobile_is_rejected() {
        assert!(matches!(whatsapp_link(" - ", "Asha"), Err(Error::InvalidRecord(_))));
    }
}
