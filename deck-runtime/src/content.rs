//! # Content 模块
//!
//! 嵌入式内容 widget 与同步屏障契约的参考实现。
//!
//! ## 契约
//!
//! 任何在幻灯片里嵌异步内容的 widget 都必须：
//!
//! 1. 在产生部分输出之前通过 [`SyncHandle::register`] 注册待定票据
//! 2. 渲染完成后 `settle()`，失败则 `fail()`，票据必须最终结清
//!
//! 幻灯片的进入过渡会被未结清的票据推迟，保证观众看到的始终是
//! 渲染完成的内容。
//!
//! ## 代码块 widget
//!
//! [`CodeBlock`] 展示语法高亮后的源代码：内联文本立即高亮；外部
//! 来源先注册票据并发出 [`Command::RequestContent`]，Host 取回文本
//! 后通过 [`PendingCode::fulfill`] 回填。

use serde::{Deserialize, Serialize};

#[cfg(feature = "code")]
use crate::barrier::ContentId;
#[cfg(feature = "code")]
use crate::barrier::SyncHandle;
#[cfg(feature = "code")]
use crate::command::Command;
#[cfg(feature = "code")]
use crate::command::SurfaceId;
#[cfg(feature = "code")]
use crate::error::SlideError;
#[cfg(feature = "code")]
use crate::slide::StepCtx;

/// 高亮后的一行代码
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightedLine {
    pub spans: Vec<StyledSpan>,
}

/// 带样式的文本片段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyledSpan {
    pub text: String,
    /// 前景色 RGB
    pub fg: [u8; 3],
    pub bold: bool,
    pub italic: bool,
}

/// 规范化缩进
///
/// 去掉首尾各一个空行，然后以第一行的缩进量为基准左移所有行。
/// 内联在脚本里的代码通常带着宿主源码的缩进，展示前剥掉。
pub fn normalize_indent(source: &str) -> String {
    let mut lines: Vec<&str> = source.lines().collect();
    if lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    let indent = lines
        .first()
        .map(|l| l.len() - l.trim_start().len())
        .unwrap_or(0);

    lines
        .iter()
        .map(|l| strip_indent(l, indent))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 从行首剥掉至多 `max` 字节的 ASCII 空白
fn strip_indent(line: &str, max: usize) -> &str {
    let mut n = 0;
    for b in line.bytes() {
        if n >= max || !b.is_ascii_whitespace() {
            break;
        }
        n += 1;
    }
    &line[n..]
}

/// 截取行范围
///
/// `start` 从 1 开始，`end` 包含在内；缺省分别为首行和末行。
pub fn clip_lines(text: &str, start: Option<usize>, end: Option<usize>) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let from = start.unwrap_or(1).saturating_sub(1).min(lines.len());
    let to = end.unwrap_or(lines.len()).min(lines.len());
    if from >= to {
        return String::new();
    }
    lines[from..to].join("\n")
}

/// 代码来源
#[cfg(feature = "code")]
#[derive(Debug, Clone, PartialEq)]
enum CodeSource {
    /// 脚本内联的源代码
    Inline(String),
    /// 外部来源（由 Host 解释的路径/URL）
    External(String),
}

/// 代码块 widget
#[cfg(feature = "code")]
#[derive(Debug, Clone)]
pub struct CodeBlock {
    source: CodeSource,
    lang: Option<String>,
    start: Option<usize>,
    end: Option<usize>,
}

#[cfg(feature = "code")]
impl CodeBlock {
    /// 内联源代码
    pub fn inline(text: impl Into<String>) -> Self {
        Self {
            source: CodeSource::Inline(text.into()),
            lang: None,
            start: None,
            end: None,
        }
    }

    /// 外部来源
    pub fn external(source: impl Into<String>) -> Self {
        Self {
            source: CodeSource::External(source.into()),
            lang: None,
            start: None,
            end: None,
        }
    }

    /// 指定语言（缺省时从外部来源的扩展名推断）
    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    /// 只展示指定行范围（从 1 开始，`end` 包含在内）
    pub fn lines(mut self, start: usize, end: usize) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// 生效的语言标记
    fn effective_lang(&self) -> String {
        if let Some(lang) = &self.lang {
            return lang.clone();
        }
        if let CodeSource::External(path) = &self.source {
            if let Some((_, ext)) = path.rsplit_once('.') {
                if !ext.is_empty() {
                    return ext.to_string();
                }
            }
        }
        "txt".to_string()
    }

    /// 挂载到幻灯片表面
    ///
    /// - 内联来源：立即高亮并发出 `MountCode`，票据当场结清，
    ///   返回 `None`
    /// - 外部来源：注册票据、发出 `RequestContent`，返回
    ///   [`PendingCode`] 供 Host 在取回文本后回填
    pub fn mount(self, cx: &mut StepCtx<'_>) -> Result<Option<PendingCode>, SlideError> {
        let lang = self.effective_lang();
        match self.source {
            CodeSource::Inline(text) => {
                let clipped = clip_lines(&normalize_indent(&text), self.start, self.end);
                let lines = highlight_source(&clipped, &lang)
                    .map_err(|reason| SlideError::script(reason))?;

                let sync = cx.sync();
                let id = sync.register();
                cx.emit(Command::MountCode {
                    surface: cx.surface(),
                    content: id,
                    lines,
                });
                sync.settle(id);
                Ok(None)
            }
            CodeSource::External(source) => {
                let sync = cx.sync();
                let id = sync.register();
                cx.emit(Command::RequestContent {
                    content: id,
                    source: source.clone(),
                });
                Ok(Some(PendingCode {
                    content: id,
                    surface: cx.surface(),
                    sync,
                    lang,
                    start: self.start,
                    end: self.end,
                }))
            }
        }
    }
}

/// 等待外部文本回填的代码块
///
/// Host 执行 `RequestContent` 取回文本后调用 [`fulfill`]；
/// 取回失败时调用 [`reject`]。两者都会结清屏障票据。
///
/// [`fulfill`]: PendingCode::fulfill
/// [`reject`]: PendingCode::reject
#[cfg(feature = "code")]
#[derive(Debug)]
pub struct PendingCode {
    content: ContentId,
    surface: SurfaceId,
    sync: SyncHandle,
    lang: String,
    start: Option<usize>,
    end: Option<usize>,
}

#[cfg(feature = "code")]
impl PendingCode {
    /// 对应的票据 id
    pub fn content_id(&self) -> ContentId {
        self.content
    }

    /// 用取回的文本完成高亮
    ///
    /// 返回 Host 应当执行的 `MountCode` 指令并结清票据。
    /// 高亮失败时票据以失败结清，错误向上传播。
    pub fn fulfill(self, text: &str) -> Result<Command, SlideError> {
        let clipped = clip_lines(text, self.start, self.end);
        match highlight_source(&clipped, &self.lang) {
            Ok(lines) => {
                self.sync.settle(self.content);
                Ok(Command::MountCode {
                    surface: self.surface,
                    content: self.content,
                    lines,
                })
            }
            Err(reason) => {
                self.sync.fail(self.content, reason.clone());
                Err(SlideError::ContentFailed {
                    content: self.content,
                    reason,
                })
            }
        }
    }

    /// 以失败结清票据（取回文本失败时）
    pub fn reject(self, reason: impl Into<String>) {
        self.sync.fail(self.content, reason);
    }
}

/// 对一段源代码做语法高亮
#[cfg(feature = "code")]
fn highlight_source(text: &str, lang: &str) -> Result<Vec<HighlightedLine>, String> {
    use std::sync::OnceLock;
    use syntect::easy::HighlightLines;
    use syntect::highlighting::{FontStyle, ThemeSet};
    use syntect::parsing::SyntaxSet;
    use syntect::util::LinesWithEndings;

    static SYNTAXES: OnceLock<SyntaxSet> = OnceLock::new();
    static THEMES: OnceLock<ThemeSet> = OnceLock::new();

    let syntaxes = SYNTAXES.get_or_init(SyntaxSet::load_defaults_newlines);
    let themes = THEMES.get_or_init(ThemeSet::load_defaults);
    let theme = &themes.themes["InspiredGitHub"];

    let syntax = syntaxes
        .find_syntax_by_token(lang)
        .unwrap_or_else(|| syntaxes.find_syntax_plain_text());

    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut lines = Vec::new();

    for line in LinesWithEndings::from(text) {
        let regions = highlighter
            .highlight_line(line, syntaxes)
            .map_err(|e| format!("语法高亮失败: {e}"))?;

        let spans = regions
            .into_iter()
            .filter_map(|(style, segment)| {
                let segment = segment.trim_end_matches('\n');
                if segment.is_empty() {
                    return None;
                }
                Some(StyledSpan {
                    text: segment.to_string(),
                    fg: [
                        style.foreground.r,
                        style.foreground.g,
                        style.foreground.b,
                    ],
                    bold: style.font_style.contains(FontStyle::BOLD),
                    italic: style.font_style.contains(FontStyle::ITALIC),
                })
            })
            .collect();

        lines.push(HighlightedLine { spans });
    }

    Ok(lines)
}
