use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

pub const ADMIN_BLOG_PATH: &str = "/admin/blog";

const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// URL builders for the blog admin controllers.
pub struct AdminLinks;

impl AdminLinks {
    fn controller(name: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!("{ADMIN_BLOG_PATH}?controller={name}");
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.extend(utf8_percent_encode(value, QUERY_VALUE));
        }
        url
    }

    pub fn post_manager() -> String {
        Self::controller("post-manager", &[])
    }

    pub fn post_update(post_id: &str) -> String {
        Self::controller("post-update", &[("id", post_id)])
    }

    pub fn ai_title_generator() -> String {
        Self::controller("ai-title-generator", &[])
    }

    pub fn ai_post_generator() -> String {
        Self::controller("ai-post-generator", &[])
    }

    pub fn ai_post_editor(record_id: &str) -> String {
        Self::controller("ai-post-editor", &[("id", record_id)])
    }

    pub fn ai_post_content_update(post_id: &str) -> String {
        Self::controller("ai-post-content-update", &[("post_id", post_id)])
    }

    pub fn blog_settings(return_url: &str) -> String {
        if return_url.is_empty() {
            return Self::controller("blog-settings", &[]);
        }
        Self::controller("blog-settings", &[("return_url", return_url)])
    }
}
