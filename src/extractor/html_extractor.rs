//! HTML标签提取器
//! 流式扫描HTML，按文档顺序提取 `<script src>`

use std::cell::RefCell;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts
};
use markup5ever::interface::Attribute;
use tendril::StrTendril;

#[derive(Debug, Default)]
pub struct HtmlExtractor {
    script_srcs: RefCell<Vec<String>>,
}

impl TokenSink for HtmlExtractor {
    type Handle = ();

    fn process_token(&self, token: Token, _line: u64) -> TokenSinkResult<()> {
        if let Token::TagToken(Tag {
            kind: TagKind::StartTag,
            name,
            attrs,
            ..
        }) = token
        {
            if name.as_ref() == "script" {
                self.collect_script_src(&attrs);
                // 脚本正文按原始文本处理，其中的标签字符串不再被识别为标签
                return TokenSinkResult::RawData(RawKind::ScriptData);
            }
        }
        TokenSinkResult::Continue
    }
}

impl HtmlExtractor {
    /// 提取HTML中所有script标签的src
    pub fn extract_script_srcs(html: &str) -> Vec<String> {
        let tokenizer = Tokenizer::new(HtmlExtractor::default(), TokenizerOpts::default());
        let queue = BufferQueue::default();
        queue.push_back(StrTendril::from(html));

        let _ = tokenizer.feed(&queue);
        tokenizer.end();

        tokenizer.sink.script_srcs.take()
    }

    fn collect_script_src(&self, attrs: &[Attribute]) {
        let src = attrs
            .iter()
            .find(|attr| attr.name.local.as_ref() == "src")
            .map(|attr| attr.value.trim().to_string());

        if let Some(src) = src.filter(|s| !s.is_empty()) {
            self.script_srcs.borrow_mut().push(src);
        }
    }
}
