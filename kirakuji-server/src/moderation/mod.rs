//! 审核规则
//!
//! 对整形后的文本做纯函数判定，不访问任何外部服务。
//! 文本先 trim，规则按顺序执行，命中第一条即拒绝：
//!
//! 1. 字符数 < 12 → `too short`
//! 2. 字符数 > 400 → `too long`
//! 3. 包含屏蔽词 (忽略大小写) → `contains blocked keyword: <kw>`
//! 4. 包含 `http://` / `https://` → `no links allowed`

/// 审核结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub accepted: bool,
    pub reason: Option<String>,
}

impl Verdict {
    pub fn accept() -> Self {
        Self {
            accepted: true,
            reason: None,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason: Some(reason.into()),
        }
    }
}

/// 审核规则集
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationRules {
    /// 最少字符数 (含)
    pub min_chars: usize,
    /// 最多字符数 (含)
    pub max_chars: usize,
    /// 屏蔽词，按小写比较
    pub blocked_keywords: Vec<String>,
}

impl Default for ModerationRules {
    fn default() -> Self {
        Self {
            min_chars: 12,
            max_chars: 400,
            blocked_keywords: ["kill", "suicide", "die"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl ModerationRules {
    pub fn evaluate(&self, text: &str) -> Verdict {
        let text = text.trim();
        let chars = text.chars().count();
        if chars < self.min_chars {
            return Verdict::reject("too short");
        }
        if chars > self.max_chars {
            return Verdict::reject("too long");
        }

        let lower = text.to_lowercase();
        if let Some(keyword) = self
            .blocked_keywords
            .iter()
            .find(|kw| lower.contains(kw.to_lowercase().as_str()))
        {
            return Verdict::reject(format!("contains blocked keyword: {}", keyword));
        }
        if lower.contains("http://") || lower.contains("https://") {
            return Verdict::reject("no links allowed");
        }

        Verdict::accept()
    }
}

/// 使用默认规则集判定
pub fn evaluate(text: &str) -> Verdict {
    ModerationRules::default().evaluate(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jp(n: usize) -> String {
        "あ".repeat(n)
    }

    #[test]
    fn test_length_boundaries() {
        assert_eq!(evaluate(&jp(11)), Verdict::reject("too short"));
        assert_eq!(evaluate(&jp(12)), Verdict::accept());
        assert_eq!(evaluate(&jp(400)), Verdict::accept());
        assert_eq!(evaluate(&jp(401)), Verdict::reject("too long"));
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        let text = "今日もよく頑張りましたね";
        assert_eq!(text.chars().count(), 12);
        assert!(text.len() > 12);
        assert!(evaluate(text).accepted);
        assert!(!evaluate("五文字です").accepted);
    }

    #[test]
    fn test_text_is_trimmed_first() {
        let padded = format!("   {}   \n", jp(11));
        assert_eq!(evaluate(&padded), Verdict::reject("too short"));
    }

    #[test]
    fn test_blocked_keyword_any_case() {
        assert_eq!(
            evaluate("Please do not KILL the mood tonight"),
            Verdict::reject("contains blocked keyword: kill")
        );
        assert_eq!(
            evaluate("thoughts of suicide come and go"),
            Verdict::reject("contains blocked keyword: suicide")
        );
    }

    #[test]
    fn test_first_failure_wins() {
        // keyword and link together: keyword rule runs first
        assert_eq!(
            evaluate("kill it at https://example.com now"),
            Verdict::reject("contains blocked keyword: kill")
        );
        // short and link together: length runs first
        assert_eq!(evaluate("https://x"), Verdict::reject("too short"));
    }

    #[test]
    fn test_links_rejected() {
        assert_eq!(
            evaluate(&format!("{}https://x", jp(20))),
            Verdict::reject("no links allowed")
        );
        assert_eq!(
            evaluate("詳しくは HTTPS://example.com を見てください"),
            Verdict::reject("no links allowed")
        );
        assert_eq!(
            evaluate("see http://example.com for more"),
            Verdict::reject("no links allowed")
        );
    }

    #[test]
    fn test_custom_rules() {
        let rules = ModerationRules {
            min_chars: 2,
            max_chars: 5,
            blocked_keywords: vec!["Bad".into()],
        };
        assert!(rules.evaluate("ok").accepted);
        assert_eq!(rules.evaluate("so bad"), Verdict::reject("too long"));
        assert_eq!(
            rules.evaluate("bad!"),
            Verdict::reject("contains blocked keyword: Bad")
        );
    }
}
