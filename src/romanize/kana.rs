//! Kana to Hepburn romaji

fn to_hiragana(c: char) -> char {
    match c {
        // ァ..ヶ sit exactly 0x60 above ぁ..ゖ
        '\u{30A1}'..='\u{30F6}' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
        _ => c,
    }
}

#[rustfmt::skip]
fn syllable(c: char) -> Option<&'static str> {
    let romaji = match c {
        'あ' => "a", 'い' => "i", 'う' => "u", 'え' => "e", 'お' => "o",
        'か' => "ka", 'き' => "ki", 'く' => "ku", 'け' => "ke", 'こ' => "ko",
        'が' => "ga", 'ぎ' => "gi", 'ぐ' => "gu", 'げ' => "ge", 'ご' => "go",
        'さ' => "sa", 'し' => "shi", 'す' => "su", 'せ' => "se", 'そ' => "so",
        'ざ' => "za", 'じ' => "ji", 'ず' => "zu", 'ぜ' => "ze", 'ぞ' => "zo",
        'た' => "ta", 'ち' => "chi", 'つ' => "tsu", 'て' => "te", 'と' => "to",
        'だ' => "da", 'ぢ' => "ji", 'づ' => "zu", 'で' => "de", 'ど' => "do",
        'な' => "na", 'に' => "ni", 'ぬ' => "nu", 'ね' => "ne", 'の' => "no",
        'は' => "ha", 'ひ' => "hi", 'ふ' => "fu", 'へ' => "he", 'ほ' => "ho",
        'ば' => "ba", 'び' => "bi", 'ぶ' => "bu", 'べ' => "be", 'ぼ' => "bo",
        'ぱ' => "pa", 'ぴ' => "pi", 'ぷ' => "pu", 'ぺ' => "pe", 'ぽ' => "po",
        'ま' => "ma", 'み' => "mi", 'む' => "mu", 'め' => "me", 'も' => "mo",
        'や' => "ya", 'ゆ' => "yu", 'よ' => "yo",
        'ら' => "ra", 'り' => "ri", 'る' => "ru", 'れ' => "re", 'ろ' => "ro",
        'わ' => "wa", 'ゐ' => "i", 'ゑ' => "e", 'を' => "o", 'ん' => "n",
        'ゔ' => "vu",
        'ぁ' => "a", 'ぃ' => "i", 'ぅ' => "u", 'ぇ' => "e", 'ぉ' => "o",
        'ゃ' => "ya", 'ゅ' => "yu", 'ょ' => "yo", 'ゎ' => "wa",
        'ゕ' => "ka", 'ゖ' => "ke",
        _ => return None,
    };
    Some(romaji)
}

/// Combines a syllable with a following small kana, e.g. き+ゃ or ふ+ァ
fn combine(base: &str, small: char) -> Option<String> {
    match small {
        'ゃ' | 'ゅ' | 'ょ' => {
            let vowel = &syllable(small)?[1..];
            let stem = base.strip_suffix('i').filter(|s| !s.is_empty())?;
            if matches!(stem, "sh" | "ch" | "j") {
                Some(format!("{stem}{vowel}"))
            } else {
                Some(format!("{stem}y{vowel}"))
            }
        }
        'ぁ' | 'ぃ' | 'ぅ' | 'ぇ' | 'ぉ' => {
            let vowel = syllable(small)?;
            match base {
                "u" => Some(format!("w{vowel}")),
                _ => {
                    let stem = base.strip_suffix(['a', 'i', 'u', 'e', 'o'])?;
                    (!stem.is_empty()).then(|| format!("{stem}{vowel}"))
                }
            }
        }
        _ => None,
    }
}

fn with_macron(vowel: char) -> Option<char> {
    Some(match vowel {
        'a' => 'ā',
        'i' => 'ī',
        'u' => 'ū',
        'e' => 'ē',
        'o' => 'ō',
        _ => return None,
    })
}

/// Full-width ASCII and Japanese punctuation to their Latin forms
fn punctuation(c: char) -> Option<char> {
    match c {
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0),
        '。' => Some('.'),
        '、' => Some(','),
        '「' | '」' | '『' | '』' => Some('"'),
        '　' | '・' => Some(' '),
        _ => None,
    }
}

pub fn is_kana(c: char) -> bool {
    matches!(c, '\u{3041}'..='\u{3096}' | '\u{30A1}'..='\u{30FA}' | 'ー')
}

/// Converts hiragana and katakana to Hepburn. `ー` becomes a macron on the
/// preceding vowel. Characters that are not kana pass through.
pub fn to_romaji(text: &str) -> String {
    let chars: Vec<char> = text.chars().map(to_hiragana).collect();
    let mut out = String::with_capacity(text.len());
    let mut geminate = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == 'っ' {
            geminate = true;
            i += 1;
            continue;
        }

        if c == 'ー' {
            if let Some(long) = out.chars().last().and_then(with_macron) {
                out.pop();
                out.push(long);
            }
            i += 1;
            continue;
        }

        let Some(base) = syllable(c) else {
            geminate = false;
            out.push(punctuation(c).unwrap_or(c));
            i += 1;
            continue;
        };

        let mut romaji = base.to_string();
        i += 1;
        if let Some(combined) = chars.get(i).and_then(|&next| combine(base, next)) {
            romaji = combined;
            i += 1;
        }

        if geminate {
            geminate = false;
            if romaji.starts_with("ch") {
                out.push('t');
            } else if let Some(first) = romaji.chars().next().filter(|f| !"aiueo".contains(*f)) {
                out.push(first);
            }
        }
        out.push_str(&romaji);
    }

    out
}
