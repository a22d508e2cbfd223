//! 内联脚本中的对象字面量解析 - 基础设施层
//!
//! 只认识 `const|let|var NAME = { ... }` 与 `window.NAME = { ... }` 这类声明，
//! 与 HTML 结构解析完全独立。支持：带引号/不带引号的键、单双引号与反引号字符串、
//! 数组、嵌套对象、裸值（数字、标识符）、`//` 与 `/* */` 注释、尾随逗号。
//! 脚本不会被执行。

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\b(?:const|let|var)\s+|\bwindow\.)([A-Za-z_$][\w$]*)\s*=\s*\{")
        .unwrap_or_else(|e| panic!("内置正则非法: {e}"))
});

/// 脚本字面量的值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptValue {
    /// 字符串或裸值（数字、标识符原样保留为文本）
    Text(String),
    List(Vec<ScriptValue>),
    Object(Vec<(String, ScriptValue)>),
    /// `null` / `undefined`
    Null,
}

impl ScriptValue {
    /// 按出现顺序收集所有文本叶子
    pub fn text_leaves(&self) -> Vec<&str> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            ScriptValue::Text(text) => out.push(text),
            ScriptValue::List(items) => items.iter().for_each(|item| item.collect_leaves(out)),
            ScriptValue::Object(entries) => {
                entries.iter().for_each(|(_, value)| value.collect_leaves(out))
            }
            ScriptValue::Null => {}
        }
    }
}

/// 一个具名的对象字面量声明
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedObject {
    pub name: String,
    pub entries: Vec<(String, ScriptValue)>,
}

/// 字面量解析错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("脚本字面量解析失败 (偏移 {offset}): {message}")]
pub struct ScriptError {
    pub offset: usize,
    pub message: String,
}

/// 扫描结果：成功解析的对象与失败的声明
#[derive(Debug, Default)]
pub struct ScriptScan {
    pub objects: Vec<NamedObject>,
    pub failures: Vec<(String, ScriptError)>,
}

/// 扫描一段脚本中的所有对象字面量声明
pub fn scan_objects(script: &str) -> ScriptScan {
    let mut scan = ScriptScan::default();

    for caps in DECLARATION.captures_iter(script) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        // 匹配以 `{` 结尾
        let brace = whole.end() - 1;
        let mut parser = LiteralParser::new(&script[brace..]);
        match parser.parse_object() {
            Ok(entries) => scan.objects.push(NamedObject {
                name: name.as_str().to_string(),
                entries,
            }),
            Err(mut err) => {
                err.offset += brace;
                scan.failures.push((name.as_str().to_string(), err));
            }
        }
    }

    scan
}

/// 对象字面量解析器（按字符游标前进）
struct LiteralParser<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> LiteralParser<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> ScriptError {
        ScriptError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn expect(&mut self, wanted: char) -> Result<(), ScriptError> {
        match self.bump() {
            Some(c) if c == wanted => Ok(()),
            Some(c) => Err(self.error(format!("期望 {:?}，实际 {:?}", wanted, c))),
            None => Err(self.error(format!("期望 {:?}，但已到结尾", wanted))),
        }
    }

    /// 跳过空白与注释
    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();

            if trimmed.starts_with("//") {
                let line_end = trimmed.find('\n').unwrap_or(trimmed.len());
                self.pos += line_end;
            } else if trimmed.starts_with("/*") {
                match trimmed[2..].find("*/") {
                    Some(end) => self.pos += end + 4,
                    None => self.pos = self.source.len(),
                }
            } else {
                return;
            }
        }
    }

    fn parse_value(&mut self) -> Result<ScriptValue, ScriptError> {
        self.skip_trivia();
        match self.peek() {
            Some('{') => self.parse_object().map(ScriptValue::Object),
            Some('[') => self.parse_list().map(ScriptValue::List),
            Some('"' | '\'' | '`') => self.parse_string().map(ScriptValue::Text),
            Some(_) => {
                let token = self.parse_bare()?;
                Ok(match token.as_str() {
                    "null" | "undefined" => ScriptValue::Null,
                    _ => ScriptValue::Text(token),
                })
            }
            None => Err(self.error("值缺失")),
        }
    }

    fn parse_object(&mut self) -> Result<Vec<(String, ScriptValue)>, ScriptError> {
        self.expect('{')?;
        let mut entries = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(entries);
            }

            let key = match self.peek() {
                Some('"' | '\'' | '`') => self.parse_string()?,
                Some(_) => self.parse_bare()?,
                None => return Err(self.error("对象未闭合")),
            };
            self.skip_trivia();
            self.expect(':')?;
            let value = self.parse_value()?;
            entries.push((key, value));

            self.skip_trivia();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(entries),
                Some(c) => return Err(self.error(format!("对象中出现意外字符 {:?}", c))),
                None => return Err(self.error("对象未闭合")),
            }
        }
    }

    fn parse_list(&mut self) -> Result<Vec<ScriptValue>, ScriptError> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some(']') {
                self.bump();
                return Ok(items);
            }

            items.push(self.parse_value()?);

            self.skip_trivia();
            match self.bump() {
                Some(',') => continue,
                Some(']') => return Ok(items),
                Some(c) => return Err(self.error(format!("数组中出现意外字符 {:?}", c))),
                None => return Err(self.error("数组未闭合")),
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, ScriptError> {
        let quote = self.bump().ok_or_else(|| self.error("字符串缺失"))?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('u') => out.push(self.parse_unicode_escape()?),
                    Some('\n') => {}
                    Some(other) => out.push(other),
                    None => return Err(self.error("字符串未闭合")),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
                None => return Err(self.error("字符串未闭合")),
            }
        }
    }

    fn parse_unicode_escape(&mut self) -> Result<char, ScriptError> {
        let hex = self.rest().get(..4).ok_or_else(|| self.error("\\u 转义不完整"))?;
        let code = u32::from_str_radix(hex, 16).map_err(|_| self.error("\\u 转义非法"))?;
        self.pos += 4;
        Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    /// 裸值：读到分隔符为止
    fn parse_bare(&mut self) -> Result<String, ScriptError> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, ',' | ':' | '}' | ']' | '/'))
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(self.error("缺少键或值"));
        }
        self.pos += end;
        Ok(rest[..end].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_mixed_literal() {
        let script = r#"
            // answer key
            const correctAnswers = {
                q1: "TRUE",
                'q2': 'not given',
                "q3": ["B", "D"], /* pair */
                q4: 7,
                q5: null,
            };
        "#;
        let scan = scan_objects(script);
        assert!(scan.failures.is_empty());
        assert_eq!(scan.objects.len(), 1);

        let object = &scan.objects[0];
        assert_eq!(object.name, "correctAnswers");
        assert_eq!(object.entries[0], ("q1".to_string(), ScriptValue::Text("TRUE".into())));
        assert_eq!(object.entries[1].1, ScriptValue::Text("not given".into()));
        assert_eq!(
            object.entries[2].1,
            ScriptValue::List(vec![ScriptValue::Text("B".into()), ScriptValue::Text("D".into())])
        );
        assert_eq!(object.entries[3].1, ScriptValue::Text("7".into()));
        assert_eq!(object.entries[4].1, ScriptValue::Null);
    }

    #[test]
    fn test_strings_keep_braces_and_escapes() {
        let script = r#"let explanations = { q1: "see \"para } B\"\nline2", q2: `it's {fine}` };"#;
        let scan = scan_objects(script);
        let entries = &scan.objects[0].entries;
        assert_eq!(entries[0].1, ScriptValue::Text("see \"para } B\"\nline2".into()));
        assert_eq!(entries[1].1, ScriptValue::Text("it's {fine}".into()));
    }

    #[test]
    fn test_nested_object_leaves() {
        let script = "window.questionAnalysis = { q3: { analysis: '第一段', tips: ['a', 'b'] } };";
        let scan = scan_objects(script);
        let object = &scan.objects[0];
        assert_eq!(object.name, "questionAnalysis");
        assert_eq!(object.entries[0].1.text_leaves(), vec!["第一段", "a", "b"]);
    }

    #[test]
    fn test_broken_literal_is_reported_not_fatal() {
        let script = "const answers = { q1: 'A', q2: ; const other = { a: 1 };";
        let scan = scan_objects(script);
        assert_eq!(scan.failures.len(), 1);
        assert_eq!(scan.failures[0].0, "answers");
        assert_eq!(scan.objects.len(), 1);
        assert_eq!(scan.objects[0].name, "other");
    }

    #[test]
    fn test_non_object_declarations_are_ignored() {
        let scan = scan_objects("const total = 13; let list = [1, 2];");
        assert!(scan.objects.is_empty());
        assert!(scan.failures.is_empty());
    }
}
