use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{
    Url,
    cookie::Jar,
    header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue},
};
use serde::Deserialize;

use crate::{
    config::AppConfig,
    error::{Result, VidnotesError},
    types::{Transcript, TranscriptFragment},
    video_id::VideoId,
};

const INNERTUBE_API_URL: &str = "https://www.youtube.com/youtubei/v1/player?key=";
const CONSENT_FORM_MARKER: &str = "action=\"https://consent.youtube.com/s\"";

/// Source of caption fragments for a video.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch(&self, video_id: &VideoId) -> Result<Transcript>;
}

/// A caption track advertised by the InnerTube player response
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionTrack {
    pub language_code: String,
    pub base_url: String,
    pub is_generated: bool,
}

/// Fetches captions through the public YouTube watch page and InnerTube API.
pub struct YouTubeTranscripts {
    client: reqwest::Client,
    cookies: Arc<Jar>,
    languages: Vec<String>,
}

impl YouTubeTranscripts {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US"));

        let cookies = Arc::new(Jar::default());
        let mut builder = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&cookies))
            .default_headers(headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            cookies,
            languages: config.transcript_languages.clone(),
        })
    }

    async fn fetch_video_html(&self, video_id: &VideoId) -> Result<String> {
        let url = video_id.watch_url();
        let html = self.get_text(&url, video_id).await?;

        if !html.contains(CONSENT_FORM_MARKER) {
            return Ok(html);
        }

        tracing::debug!(%video_id, "accepting YouTube consent form");
        self.create_consent_cookie(&html, video_id)?;
        let html = self.get_text(&url, video_id).await?;
        if html.contains(CONSENT_FORM_MARKER) {
            return Err(VidnotesError::YouTubeDataUnparsable {
                video_id: video_id.to_string(),
            });
        }
        Ok(html)
    }

    async fn get_text(&self, url: &str, video_id: &VideoId) -> Result<String> {
        let response = self.client.get(url).send().await?;
        check_http_errors(&response, video_id)?;
        Ok(response.text().await?)
    }

    fn create_consent_cookie(&self, html: &str, video_id: &VideoId) -> Result<()> {
        let re = Regex::new(r#"name="v" value="(.*?)""#).map_err(|_| {
            VidnotesError::YouTubeDataUnparsable {
                video_id: video_id.to_string(),
            }
        })?;
        let value = re
            .captures(html)
            .and_then(|c| c.get(1))
            .ok_or_else(|| VidnotesError::YouTubeDataUnparsable {
                video_id: video_id.to_string(),
            })?;

        let youtube = Url::parse("https://www.youtube.com")?;
        self.cookies.add_cookie_str(
            &format!("CONSENT=YES+{}; Domain=.youtube.com", value.as_str()),
            &youtube,
        );
        Ok(())
    }

    async fn fetch_innertube_data(
        &self,
        video_id: &VideoId,
        api_key: &str,
    ) -> Result<serde_json::Value> {
        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": "ANDROID",
                    "clientVersion": "20.10.38"
                }
            },
            "videoId": video_id.as_str()
        });

        let response = self
            .client
            .post(format!("{}{}", INNERTUBE_API_URL, api_key))
            .json(&body)
            .send()
            .await?;
        check_http_errors(&response, video_id)?;

        Ok(response.json::<serde_json::Value>().await?)
    }

    async fn fetch_fragments(
        &self,
        video_id: &VideoId,
        track: &CaptionTrack,
    ) -> Result<Vec<TranscriptFragment>> {
        if track.base_url.contains("&exp=xpe") {
            return Err(VidnotesError::VideoUnplayable {
                video_id: video_id.to_string(),
                reason: "captions require a PO token".to_string(),
            });
        }

        let url = format!("{}&fmt=json3", track.base_url.replace("&fmt=srv3", ""));
        let body = self.get_text(&url, video_id).await?;
        parse_json3(&body)
    }
}

#[async_trait]
impl TranscriptSource for YouTubeTranscripts {
    async fn fetch(&self, video_id: &VideoId) -> Result<Transcript> {
        let html = self.fetch_video_html(video_id).await?;
        let api_key = extract_innertube_api_key(&html, video_id)?;
        let data = self.fetch_innertube_data(video_id, &api_key).await?;
        let tracks = caption_tracks(video_id, &data)?;
        let track = select_track(video_id, &tracks, &self.languages)?;

        tracing::debug!(
            %video_id,
            language = %track.language_code,
            generated = track.is_generated,
            "downloading caption track"
        );
        let fragments = self.fetch_fragments(video_id, track).await?;

        Ok(Transcript {
            video_id: video_id.clone(),
            language_code: track.language_code.clone(),
            fragments,
        })
    }
}

fn check_http_errors(response: &reqwest::Response, video_id: &VideoId) -> Result<()> {
    let status = response.status();
    if status.as_u16() == 429 {
        return Err(VidnotesError::RequestBlocked {
            video_id: video_id.to_string(),
        });
    }
    if !status.is_success() {
        return Err(VidnotesError::HttpStatus {
            service: "YouTube",
            status: status.as_u16(),
        });
    }
    Ok(())
}

pub fn extract_innertube_api_key(html: &str, video_id: &VideoId) -> Result<String> {
    if html.contains("class=\"g-recaptcha\"") {
        return Err(VidnotesError::RequestBlocked {
            video_id: video_id.to_string(),
        });
    }

    let unparsable = || VidnotesError::YouTubeDataUnparsable {
        video_id: video_id.to_string(),
    };
    let re = Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).map_err(|_| unparsable())?;

    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(unparsable)
}

fn assert_playability(video_id: &VideoId, data: &serde_json::Value) -> Result<()> {
    let Some(playability) = data.get("playabilityStatus") else {
        return Ok(());
    };

    let status = playability["status"].as_str().unwrap_or("");
    if status == "OK" {
        return Ok(());
    }
    let reason = playability["reason"].as_str().unwrap_or("");
    let id = video_id.to_string();

    match status {
        "LOGIN_REQUIRED" if reason.contains("not a bot") => {
            Err(VidnotesError::RequestBlocked { video_id: id })
        }
        "LOGIN_REQUIRED" if reason.contains("inappropriate for some users") => {
            Err(VidnotesError::AgeRestricted { video_id: id })
        }
        "ERROR" if reason.contains("unavailable") => {
            Err(VidnotesError::VideoUnavailable { video_id: id })
        }
        _ => Err(VidnotesError::VideoUnplayable {
            video_id: id,
            reason: reason.to_string(),
        }),
    }
}

/// List the caption tracks of an InnerTube player response.
pub fn caption_tracks(video_id: &VideoId, data: &serde_json::Value) -> Result<Vec<CaptionTrack>> {
    assert_playability(video_id, data)?;

    let tracks: Vec<CaptionTrack> = data
        .pointer("/captions/playerCaptionsTracklistRenderer/captionTracks")
        .and_then(|t| t.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|caption| {
                    Some(CaptionTrack {
                        language_code: caption["languageCode"].as_str()?.to_string(),
                        base_url: caption["baseUrl"].as_str()?.to_string(),
                        is_generated: caption["kind"].as_str() == Some("asr"),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    if tracks.is_empty() {
        return Err(VidnotesError::TranscriptsDisabled {
            video_id: video_id.to_string(),
        });
    }
    Ok(tracks)
}

/// Pick a track by language preference, manual tracks before generated ones.
pub fn select_track<'a>(
    video_id: &VideoId,
    tracks: &'a [CaptionTrack],
    languages: &[String],
) -> Result<&'a CaptionTrack> {
    for lang in languages {
        let by_lang = |generated: bool| {
            tracks
                .iter()
                .find(|t| t.language_code == *lang && t.is_generated == generated)
        };
        if let Some(track) = by_lang(false).or_else(|| by_lang(true)) {
            return Ok(track);
        }
    }

    Err(VidnotesError::NoTranscriptFound {
        video_id: video_id.to_string(),
        languages: languages.to_vec(),
    })
}

#[derive(Deserialize)]
struct Json3Captions {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Decode a `json3` caption document into fragments, in document order.
pub fn parse_json3(body: &str) -> Result<Vec<TranscriptFragment>> {
    let captions: Json3Captions = serde_json::from_str(body)?;

    Ok(captions
        .events
        .into_iter()
        .filter_map(|event| {
            let raw: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = decode_html_entities(&raw)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if text.is_empty() {
                return None;
            }
            Some(TranscriptFragment {
                text,
                start: event.t_start_ms as f64 / 1000.0,
                duration: event.d_duration_ms as f64 / 1000.0,
            })
        })
        .collect())
}

fn decode_html_entities(text: &str) -> String {
    text.replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
