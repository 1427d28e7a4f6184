/// Builds the classification prompt sent to the generation model.
///
/// The query is embedded verbatim. The template asks for the exact JSON shape
/// [`WorkRecord`](crate::models::WorkRecord) deserializes and forbids markdown
/// fences or any surrounding text.
pub fn build_prompt(query: &str) -> String {
    format!(
        r#""{query}"에 대해 다음 정보를 JSON 형식으로 제공해주세요:

{{
  "title": "작품명 (한글)",
  "tmdbQuery": "영문 작품명 (TMDB 검색용)",
  "tag": "책 → 영화" 또는 "영화 → 책" 또는 "애니 → 책" 등,
  "original": "원작 정보 (예: J.R.R. 톨킨의 소설)",
  "recommendation": "추천 순서 (예: 책부터 읽는 것을 강력 추천합니다)",
  "reason": "추천 이유 (2-3문장, 구체적으로)",
  "order": ["감상 순서 배열 - 각 항목은 명확하게"],
  "tips": ["팁 배열 - 2-3개의 유용한 팁"]
}}

JSON만 응답하고 다른 텍스트는 포함하지 마세요. 마크다운 코드 블록도 사용하지 마세요."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_query_verbatim() {
        let prompt = build_prompt("해리포터");
        assert!(prompt.starts_with("\"해리포터\"에 대해"));
    }

    #[test]
    fn test_prompt_keeps_special_characters() {
        let prompt = build_prompt(r#"Dune {part "two"}"#);
        assert!(prompt.contains(r#""Dune {part "two"}""#));
    }

    #[test]
    fn test_prompt_requests_every_field() {
        let prompt = build_prompt("Dune");
        for field in [
            "title",
            "tmdbQuery",
            "tag",
            "original",
            "recommendation",
            "reason",
            "order",
            "tips",
        ] {
            assert!(prompt.contains(&format!("\"{field}\"")), "missing {field}");
        }
        assert!(prompt.contains("마크다운 코드 블록도 사용하지 마세요"));
    }
}
