//! Built-in server-rendered pages.
//!
//! Deployments that want a fancier frontend can point `frontend_dir_path`
//! at a static build instead; these pages are the fallback surface.

use crate::catalog::Track;
use crate::recommend::Recommendation;

const STYLE: &str = r#"
body { font-family: "Noto Sans TC", sans-serif; max-width: 720px; margin: 2rem auto; padding: 0 1rem; color: #222; }
h1 { font-size: 1.6rem; }
.description { background: #f6f4ef; border-radius: 8px; padding: 1rem; line-height: 1.8; }
.track { display: flex; align-items: center; gap: 1rem; margin: 1rem 0; }
.track img { width: 96px; height: 96px; object-fit: cover; border-radius: 6px; }
.error { color: #a33; background: #fbeeee; border-radius: 8px; padding: 1rem; }
form textarea { width: 100%; min-height: 6rem; }
form input[type=submit] { margin-top: 1rem; padding: 0.5rem 1.5rem; }
"#;

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"zh-TW\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>",
        escape(title),
        STYLE,
        body
    )
}

pub fn landing_page() -> String {
    page(
        "Moodtune",
        "<h1>🎵 Moodtune — 情緒音樂推薦</h1>\
         <p>上傳一張圖片，或描述一個場景與心情，讓 AI 分析它的情緒並推薦適合的音樂。</p>\
         <p><a href=\"/music\">開始分析 →</a></p>",
    )
}

pub fn music_form_page() -> String {
    page(
        "情緒分析與音樂推薦",
        "<h1>📝 情緒分析與音樂推薦</h1>\
         <form action=\"/music\" method=\"post\" enctype=\"multipart/form-data\">\
         <p>上傳圖片：<input type=\"file\" name=\"image\" accept=\"image/*\"></p>\
         <p>或輸入描述一個場景、情境或心情的文字：</p>\
         <textarea name=\"text\" placeholder=\"例如：下雨的夜晚，一個人走在回家的路上…\"></textarea>\
         <input type=\"submit\" value=\"分析並推薦音樂\">\
         </form>",
    )
}

pub fn result_page(recommendation: &Recommendation) -> String {
    let mut body = String::from("<h1>🎨 情緒分析結果</h1>");

    body.push_str(&format!(
        "<div class=\"description\">{}</div>",
        escape(&recommendation.mood.description)
    ));

    if let Some(audio) = &recommendation.audio_data_uri {
        body.push_str(&format!(
            "<p><audio controls src=\"{}\"></audio></p>",
            audio
        ));
    }

    body.push_str("<h1>🎧 推薦音樂</h1>");
    if recommendation.tracks.is_empty() {
        body.push_str("<p>找不到符合這個情緒的音樂，換個描述試試看吧。</p>");
    } else {
        for track in &recommendation.tracks {
            body.push_str(&render_track(track));
        }
    }

    body.push_str("<p><a href=\"/music\">← 再試一次</a></p>");
    page("情緒分析結果", &body)
}

fn render_track(track: &Track) -> String {
    format!(
        "<div class=\"track\">\
         <img src=\"{image}\" alt=\"cover\">\
         <div><strong>{name}</strong> - {artist}<br>\
         <a href=\"{url}\" target=\"_blank\" rel=\"noopener\">Spotify 連結</a></div>\
         </div>",
        image = escape(&track.image_url),
        name = escape(&track.name),
        artist = escape(&track.artist),
        url = escape(&track.url),
    )
}

pub fn error_page(message: &str) -> String {
    let body = format!(
        "<h1>😞 發生錯誤</h1><div class=\"error\">{}</div>\
         <p><a href=\"/music\">← 回到上一頁</a></p>",
        escape(message)
    );
    page("發生錯誤", &body)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
