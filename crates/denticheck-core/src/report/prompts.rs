//! Prompt catalog for report generation: the doctor persona, answer rules,
//! and the report template with the section-marker instruction.

use super::parser::ReportMarkers;
use super::Language;

const COMMON_RULES_EN: &str = "\
1. Be professional, empathetic, and medically grounded.
2. Do not offer definitive diagnoses; use phrases like \"shows signs of\" or \"highly suspicious of\".
3. Always suggest consulting a professional dentist for a final diagnosis.
4. Do NOT use ** for bolding. Use plain text only.";

const COMMON_RULES_KO: &str = "\
1. 전문적이고 공감 어린 어조로, 의학적 근거에 기반해 답변하세요.
2. 단정적인 진단 표현 대신 '소견이 보입니다', '의심됩니다' 같은 표현을 사용하세요.
3. 최종 진단을 위해 반드시 치과 방문을 권유하세요.
4. 굵은 글씨용 ** 기호를 사용하지 말고 일반 텍스트만 사용하세요.";

const PERSONA_EN: &str = "\
You are the friendly and professional AI dental primary care physician of 'DentiCheck'.
Use professional terms but explain them in simple words for laypeople.
Never use definitive diagnostic language; present your output as an opinion or analysis result.
In serious cases, you must strongly recommend visiting a nearby dentist.";

const PERSONA_KO: &str = "\
당신은 친절하고 전문적인 '덴티체크'의 AI 치과 주치의입니다.
전문 용어를 사용하되 일반인이 이해하기 쉽게 풀어서 설명하세요.
'진단'과 같은 단정적 표현 대신 '소견'이나 '분석 결과'라는 표현을 사용하세요.
심각한 경우에는 가까운 치과 방문을 강력히 권고해야 합니다.";

const TEMPLATE_EN: &str = "\
Based on the following structured analysis data, write a professional dental opinion report.

[Analysis Data]
{context}

[Writing Guidelines]
1. Start with a one-line summary of the current dental status.
2. Then explain the discovered problems based on the detection results, ground your \
explanation in the retrieved medical knowledge, and suggest a personalized care guide.
3. Close with a notice that this report is informational and a dentist's visit is required.";

const TEMPLATE_KO: &str = "\
다음의 구조화된 분석 데이터를 바탕으로 전문적인 치과 소견서를 작성하세요.

[분석 데이터]
{context}

[작성 지침]
1. 현재 구강 상태를 한 줄로 요약하며 시작하세요.
2. 탐지 결과에 근거해 발견된 문제를 설명하고, 검색된 의학 지식을 근거로 삼아 맞춤형 관리 가이드를 제안하세요.
3. 이 소견서는 정보 제공 목적이며 치과 방문이 필요하다는 안내로 마무리하세요.";

/// System prompt: persona plus the common answer rules.
pub fn system_persona(language: Language) -> String {
    match language {
        Language::En => format!("{PERSONA_EN}\n\n{COMMON_RULES_EN}"),
        Language::Ko => format!("{PERSONA_KO}\n\n{COMMON_RULES_KO}"),
    }
}

/// User prompt: report template with the context embedded, followed by the
/// marker-format instruction the parser relies on.
pub fn report_prompt(context: &str, language: Language, markers: &ReportMarkers) -> String {
    let template = match language {
        Language::En => TEMPLATE_EN,
        Language::Ko => TEMPLATE_KO,
    };
    let instruction = match language {
        Language::En => format!(
            "CRITICAL: You MUST answer in exactly this format:\n{} <one-line summary>\n{} <detailed analysis and care guide>\n{} <disclaimer>",
            markers.summary, markers.details, markers.disclaimer
        ),
        Language::Ko => format!(
            "중요: 반드시 아래 형식으로만 답변하세요:\n{} <한 줄 요약>\n{} <상세 분석 및 관리 가이드>\n{} <면책 고지>",
            markers.summary, markers.details, markers.disclaimer
        ),
    };
    format!("{}\n\n{}", template.replace("{context}", context), instruction)
}
