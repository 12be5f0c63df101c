//! Prompt text for paragraph rewriting.
//!
//! Every prompt lives here so a wording change touches exactly one place and
//! unit tests can inspect the assembled prompt without calling a model.
//!
//! The instruction block is fixed. Only two things vary per call: whether the
//! knowledge-base excerpt is present, and the paragraph itself. Section
//! numbers continue from the instruction block, so the paragraph section is
//! "五" without a reference and "六" with one.

/// Fixed rewriting instructions (sections 一 to 四).
pub const REWRITE_INSTRUCTIONS: &str = r#"一、角色：一名普通的大学四年级学生
二、任务：对论文段落重新编写，使段落表达更贴近自然表述
三、编写要求：
1. 可删减冗余连接词，将部分书面化连接词替换为更口语化的简单表述，允许适当重复核心名词；
2. 采用更灵活的句式结构，可拆分长句、调整短语顺序，使用更通俗的动词表达；
3. 调整功能描述的呈现方式，可将并列功能用更具层次感的表述拆分，允许适当添加补充性表述；
4. 避免使用复杂长句，采用短句组合，不添加 "我" 等人称，可用 "本文" 替代；
5. 确保核心信息不遗漏；
6. 需要保持一定的学术风格。
四、输出要求：只需要输出重写之后的论文段落，不要输出任何其他内容。"#;

/// Heading of the optional style-reference section.
const KNOWLEDGE_HEADING: &str = "五、写作风格参考（AI风格转人类风格示例）：";

/// Assemble the full prompt for one paragraph.
///
/// `knowledge` is the style-reference document; `None` or a blank string
/// omits the reference section entirely. The paragraph is wrapped in `'''`
/// so the model can tell it apart from the instructions.
pub fn build_rewrite_prompt(paragraph: &str, knowledge: Option<&str>) -> String {
    let mut prompt = String::with_capacity(
        REWRITE_INSTRUCTIONS.len() + paragraph.len() + knowledge.map_or(0, str::len) + 128,
    );
    prompt.push_str(REWRITE_INSTRUCTIONS);

    let paragraph_section = match knowledge.filter(|k| !k.trim().is_empty()) {
        Some(k) => {
            prompt.push_str("\n\n");
            prompt.push_str(KNOWLEDGE_HEADING);
            prompt.push('\n');
            prompt.push_str(k);
            "六"
        }
        None => "五",
    };

    prompt.push_str(&format!(
        "\n\n{paragraph_section}、需要重新编写的论文段落如下：\n'''{paragraph}'''"
    ));
    prompt
}
