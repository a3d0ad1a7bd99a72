// ABOUTME: Stable reply sentinels (timeout, no output, error, empty prompt) in English and Chinese.
// ABOUTME: Front ends can match on these strings to special-case non-answers.
use openab_agent::Env;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lang {
    #[default]
    En,
    Zh,
}

impl Lang {
    /// `zh`, `zh-CN`, `zh_TW.UTF-8` ... select Chinese; everything else is English
    pub fn from_code(code: &str) -> Self {
        if code.trim().to_ascii_lowercase().starts_with("zh") {
            Lang::Zh
        } else {
            Lang::En
        }
    }

    /// First of LC_ALL, LANGUAGE, LANG that is set
    pub fn from_env(env: &Env) -> Self {
        ["LC_ALL", "LANGUAGE", "LANG"]
            .into_iter()
            .find_map(|var| env.get(var))
            .map(Self::from_code)
            .unwrap_or_default()
    }

    pub fn timed_out(self) -> &'static str {
        match self {
            Lang::En => "⏱ Request timed out. Try a shorter prompt or try again later.",
            Lang::Zh => "⏱ 执行超时，请缩短问题或稍后重试。",
        }
    }

    pub fn no_output(self) -> &'static str {
        match self {
            Lang::En => "(no text output)",
            Lang::Zh => "（无文本输出）",
        }
    }

    pub fn empty_prompt(self) -> &'static str {
        match self {
            Lang::En => "Please send some text as the prompt for the agent.",
            Lang::Zh => "请发送一段文字作为给智能体的提示。",
        }
    }

    pub fn agent_error(self, error: &dyn std::fmt::Display) -> String {
        match self {
            Lang::En => format!("Error: {error}"),
            Lang::Zh => format!("执行出错：{error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(Lang::from_code("zh"), Lang::Zh);
        assert_eq!(Lang::from_code("zh_CN.UTF-8"), Lang::Zh);
        assert_eq!(Lang::from_code("en-US"), Lang::En);
        assert_eq!(Lang::from_code(""), Lang::En);
    }

    #[test]
    fn test_from_env_precedence() {
        let env = Env::from_pairs([("LANG", "en_US.UTF-8"), ("LC_ALL", "zh_CN.UTF-8")]);
        assert_eq!(Lang::from_env(&env), Lang::Zh);
        assert_eq!(Lang::from_env(&Env::default()), Lang::En);
    }

    #[test]
    fn test_error_reply_includes_message() {
        assert_eq!(Lang::En.agent_error(&"boom"), "Error: boom");
        assert_eq!(Lang::Zh.agent_error(&"boom"), "执行出错：boom");
    }
}
