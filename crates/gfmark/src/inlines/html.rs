//! Fixed-grammar lookahead for raw HTML and angle-bracket autolinks

use once_cell::sync::Lazy;
use regex::Regex;

const TAG_NAME: &str = "[A-Za-z][A-Za-z0-9-]*";
const ATTRIBUTE_NAME: &str = "[a-zA-Z_:][a-zA-Z0-9_.:-]*";
const UNQUOTED_VALUE: &str = "[^\"'=<>`\\x00-\\x20]+";
const SINGLE_QUOTED_VALUE: &str = "'[^']*'";
const DOUBLE_QUOTED_VALUE: &str = "\"[^\"]*\"";

/// An opening tag with attributes, as used by raw HTML and HTML blocks
pub(crate) static OPEN_TAG: Lazy<String> = Lazy::new(|| {
    let value = format!("(?:{UNQUOTED_VALUE}|{SINGLE_QUOTED_VALUE}|{DOUBLE_QUOTED_VALUE})");
    let attribute = format!("(?:\\s+{ATTRIBUTE_NAME}(?:\\s*=\\s*{value})?)");
    format!("<{TAG_NAME}{attribute}*\\s*/?>")
});

pub(crate) static CLOSE_TAG: Lazy<String> = Lazy::new(|| format!("</{TAG_NAME}\\s*>"));

static RAW_HTML: Lazy<Regex> = Lazy::new(|| {
    let comment = "<!-->|<!--->|<!--[\\s\\S]*?-->";
    let processing = "<\\?[\\s\\S]*?\\?>";
    let declaration = "<![A-Za-z]+[^>]*>";
    let cdata = "<!\\[CDATA\\[[\\s\\S]*?\\]\\]>";
    Regex::new(&format!(
        "^(?:{}|{}|{comment}|{processing}|{declaration}|{cdata})",
        *OPEN_TAG, *CLOSE_TAG
    ))
    .unwrap()
});

static URI_AUTOLINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<[A-Za-z][A-Za-z0-9.+-]{1,31}:[^<>\x00-\x20]*>").unwrap());

static EMAIL_AUTOLINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^<[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*>",
    )
    .unwrap()
});

/// Length of the raw HTML construct at the start of `s`
pub(crate) fn scan_raw_html(s: &str) -> Option<usize> {
    RAW_HTML.find(s).map(|m| m.end())
}

/// Length of a `<scheme:...>` autolink at the start of `s`
pub(crate) fn scan_uri_autolink(s: &str) -> Option<usize> {
    URI_AUTOLINK.find(s).map(|m| m.end())
}

/// Length of a `<user@host>` autolink at the start of `s`
pub(crate) fn scan_email_autolink(s: &str) -> Option<usize> {
    EMAIL_AUTOLINK.find(s).map(|m| m.end())
}
