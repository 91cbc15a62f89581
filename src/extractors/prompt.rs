/// Value the model is told to use for a field it cannot locate.
pub const NOT_FOUND_SENTINEL: &str = "未找到相关信息";

/// Builds the instruction sent to the model.
///
/// OCR fragments are embedded in their given order as a JSON array of strings,
/// so an empty OCR result still yields a well-formed prompt (`[]`).
pub fn build_extraction_prompt<S: AsRef<str>>(fragments: &[S], field_names: &[&str]) -> String {
    let ocr_text = format!(
        "[{}]",
        fragments
            .iter()
            .map(|fragment| serde_json::Value::String(fragment.as_ref().to_string()).to_string())
            .collect::<Vec<String>>()
            .join(", ")
    );
    let field_descriptions = field_names
        .iter()
        .map(|field_name| format!("- {field_name}: OCR结果中的{field_name}。"))
        .collect::<Vec<String>>()
        .join("\n");
    let field_list = field_names.join(", ");

    format!(
        "你的任务是从OCR文字识别的结果中提取指定的关键信息。OCR识别结果用```符号包裹，其中的文本按照原始图像从左至右、从上至下的顺序排列。需要提取的关键信息用[]符号包裹。

注意事项：
1. OCR识别结果可能存在长句被截断、分词不规范、内容错位等问题。
2. 请结合上下文语义进行综合判断，提取准确的关键信息。
3. 如果OCR结果中找不到某项关键信息，请将其值设置为“{NOT_FOUND_SENTINEL}”。

请以JSON格式返回结果，包含以下key：
{field_descriptions}

只输出JSON格式的结果，不要包含任何其他内容！现在开始：

OCR文字：```{ocr_text}```

需要提取的关键信息：[{field_list}]。
"
    )
}
