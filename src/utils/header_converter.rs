//! Header格式转换工具
//! 把各种来源的响应头统一为 小写名称 -> 有序值列表

use std::collections::HashMap;
use reqwest::header::HeaderMap;
use tracing::{debug, warn};

/// 归一化后的响应头
pub type HeaderValues = HashMap<String, Vec<String>>;

/// Header转换工具
pub struct HeaderConverter;

impl HeaderConverter {
    /// Header名称归一化：小写，下划线转连字符
    pub fn normalize_name(name: &str) -> String {
        name.trim().replace('_', "-").to_lowercase()
    }

    /// 解析 `Name: value` 形式的原始响应头文本
    /// 以 `http/` 开头的状态行会被跳过
    pub fn from_raw(raw_headers: &str) -> HeaderValues {
        let mut map = HeaderValues::new();

        for line in raw_headers.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.to_lowercase().starts_with("http/") {
                continue;
            }

            let (name, value) = match line.split_once(':') {
                Some((name, value)) => (name, value.trim()),
                None => (line, ""),
            };
            let name = Self::normalize_name(name);
            if name.is_empty() {
                continue;
            }
            map.entry(name).or_default().push(value.to_string());
        }

        map
    }

    /// 将HeaderMap转换为归一化的HashMap，重复Header按出现顺序保留
    pub fn to_hashmap(header_map: &HeaderMap) -> HeaderValues {
        let mut map = HeaderValues::new();

        for (key, value) in header_map.iter() {
            let value_str = match value.to_str() {
                Ok(v) => v.to_string(),
                Err(_) => {
                    warn!("Header {} 的值不是可见ASCII，按有损方式转换", key);
                    String::from_utf8_lossy(value.as_bytes()).into_owned()
                }
            };
            map.entry(Self::normalize_name(key.as_str()))
                .or_default()
                .push(value_str);
        }

        debug!("Header转换完成，生成{}条记录", map.len());
        map
    }

    /// 从 set-cookie 中解析 Cookie 名 -> 值
    /// 每条 set-cookie 按 `;` 再按 `=` 拆分，值取名称后的第一段，同名时后出现的覆盖先出现的
    pub fn parse_cookies(headers: &HeaderValues) -> HashMap<String, String> {
        let mut cookies = HashMap::new();

        let Some(set_cookies) = headers.get("set-cookie") else {
            return cookies;
        };
        for set_cookie in set_cookies {
            for pair in set_cookie.split(';') {
                let mut parts = pair.split('=');
                let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                    continue;
                };
                let key = key.trim().to_lowercase();
                if key.is_empty() {
                    continue;
                }
                cookies.insert(key, value.trim().to_string());
            }
        }

        cookies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_from_raw() {
        let raw = "HTTP/1.1 200 OK\r\nServer: nginx/1.21.6\r\nX_Powered_By: PHP/8.1\r\nDate: Mon, 01 Jan 2024 10:00:00 GMT\r\nSet-Cookie: a=1\r\nset-cookie: b=2\r\n\r\n";
        let headers = HeaderConverter::from_raw(raw);

        assert_eq!(headers.len(), 4);
        assert_eq!(headers["server"], vec!["nginx/1.21.6".to_string()]);
        assert_eq!(headers["x-powered-by"], vec!["PHP/8.1".to_string()]);
        assert_eq!(headers["date"], vec!["Mon, 01 Jan 2024 10:00:00 GMT".to_string()]);
        assert_eq!(headers["set-cookie"], vec!["a=1".to_string(), "b=2".to_string()]);
        assert!(!headers.keys().any(|k| k.starts_with("http/")));
    }

    #[test]
    fn test_to_hashmap_keeps_repeats() {
        let mut header_map = HeaderMap::new();
        header_map.append("via", HeaderValue::from_static("1.1 varnish"));
        header_map.append("via", HeaderValue::from_static("1.1 squid"));
        header_map.insert("x-generator", HeaderValue::from_static("Drupal 9"));

        let headers = HeaderConverter::to_hashmap(&header_map);
        assert_eq!(headers["via"], vec!["1.1 varnish".to_string(), "1.1 squid".to_string()]);
        assert_eq!(headers["x-generator"], vec!["Drupal 9".to_string()]);
    }

    #[test]
    fn test_parse_cookies() {
        let headers = HeaderConverter::from_raw(
            "Set-Cookie: PHPSESSID=abc; path=/; HttpOnly\nSet-Cookie: token=x==; phpsessid=def\n",
        );
        let cookies = HeaderConverter::parse_cookies(&headers);

        assert_eq!(cookies["phpsessid"], "def");
        assert_eq!(cookies["path"], "/");
        // 值只取名称后的第一段，`x==` 中的补位 `=` 被截断
        assert_eq!(cookies["token"], "x");
        assert!(!cookies.contains_key("httponly"));
    }

    #[test]
    fn test_parse_cookies_without_header() {
        assert!(HeaderConverter::parse_cookies(&HeaderValues::new()).is_empty());
    }
}
