//! # 바이너리 주(week) 코덱
//!
//! 한 주의 요일별 가능 여부를 7자리 이진 문자열(예: `"1010101"`)로 표현하고,
//! 저장할 때는 이를 10진수 정수(0~127)로 바꿔 `|`로 이어 붙인 한 줄 문자열로 저장합니다.
//!
//! 이 모듈의 함수들:
//! - `encode()`: `"1010101"` → `85`
//! - `decode()`: `85` → `"1010101"`
//! - `join_weeks()`: `[85, 0]` → `"85|0"` (저장 형식)
//! - `split_weeks()`: `"85|0"` → `["1010101", "0000000"]` (응답 형식)

use thiserror::Error;

/// 한 주를 나타내는 이진 문자열의 길이 (요일 7개)
pub const WEEK_LEN: usize = 7;

/// 7비트로 표현할 수 있는 최댓값 (0b1111111)
pub const MAX_WEEK_VALUE: u8 = 0b111_1111;

/// 저장 형식에서 주(week) 값들을 구분하는 문자.
/// 토큰은 항상 10진수 숫자로만 이루어지므로 구분자와 겹치지 않습니다.
pub const WEEK_DELIMITER: char = '|';

/// 코덱 변환 실패 종류
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// 입력이 `^[01]{7}$` 형식이 아님
    #[error("invalid binary week {0:?}: expected exactly 7 characters of '0' or '1'")]
    InvalidFormat(String),

    /// 10진수 값이 7비트 범위(0~127)를 벗어남
    #[error("week value {0} does not fit in 7 bits")]
    OutOfRange(u32),

    /// 저장된 토큰이 10진수 정수가 아님
    #[error("stored week token {0:?} is not a decimal number")]
    CorruptToken(String),
}

/// 7자리 이진 문자열을 10진수 값으로 변환합니다.
///
/// 길이가 정확히 7이 아니거나 `'0'`/`'1'` 이외의 문자가 있으면 `InvalidFormat`.
pub fn encode(week: &str) -> Result<u8, CodecError> {
    // 바이트 단위로 검사합니다. 멀티바이트 문자는 '0'/'1'이 아니므로 어차피 거부됩니다.
    let bytes = week.as_bytes();
    if bytes.len() != WEEK_LEN {
        return Err(CodecError::InvalidFormat(week.to_string()));
    }

    // 예: "1010101" → 85
    // fold: 왼쪽(최상위 비트)부터 한 자리씩 밀어 넣으며 값을 누적합니다.
    bytes.iter().try_fold(0u8, |acc, &b| match b {
        b'0' => Ok(acc << 1),
        b'1' => Ok((acc << 1) | 1),
        _ => Err(CodecError::InvalidFormat(week.to_string())),
    })
}

/// 10진수 값을 0으로 채운 7자리 이진 문자열로 변환합니다.
///
/// 127을 넘는 값은 7자리에 담을 수 없으므로 `OutOfRange`를 반환합니다.
pub fn decode(value: u8) -> Result<String, CodecError> {
    if value > MAX_WEEK_VALUE {
        return Err(CodecError::OutOfRange(u32::from(value)));
    }
    // {:07b}: 이진수, 최소 7자리, 빈 자리는 0으로 채움
    Ok(format!("{:07b}", value))
}

/// 인코딩된 값들을 저장 형식(`"85|0|127"`)으로 합칩니다.
pub fn join_weeks(values: &[u8]) -> String {
    values
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(WEEK_DELIMITER.to_string().as_str())
}

/// 저장 형식 문자열을 7자리 이진 문자열 목록으로 되돌립니다.
///
/// 토큰은 `join_weeks`가 만드는 형태(부호 없음, 0 하나를 빼면 앞자리 0 없음)만 받습니다.
/// 그 밖의 토큰은 `CorruptToken`, 127을 넘으면 `OutOfRange`.
pub fn split_weeks(stored: &str) -> Result<Vec<String>, CodecError> {
    stored
        .split(WEEK_DELIMITER)
        .map(|token| {
            if !is_canonical_decimal(token) {
                return Err(CodecError::CorruptToken(token.to_string()));
            }
            let value: u32 = token
                .parse()
                .map_err(|_| CodecError::CorruptToken(token.to_string()))?;
            let value = u8::try_from(value).map_err(|_| CodecError::OutOfRange(value))?;
            decode(value)
        })
        .collect()
}

/// `"0"` 또는 `1-9`로 시작하는 숫자열
fn is_canonical_decimal(token: &str) -> bool {
    match token.as_bytes() {
        [b'0'] => true,
        [first, rest @ ..] => {
            (b'1'..=b'9').contains(first) && rest.iter().all(u8::is_ascii_digit)
        }
        [] => false,
    }
}
