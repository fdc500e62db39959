//! Tool descriptors exposed by yt-mcp.

use super::schema::{Field, FieldType, Schema};
use super::OperationDescriptor;

pub const GET_VIDEO_INFO: &str = "get_video_info";
pub const DOWNLOAD_VIDEO: &str = "download_video";
pub const DOWNLOAD_VIDEO_SLICE: &str = "download_video_slice";
pub const DOWNLOAD_AUDIO: &str = "download_audio";
pub const DOWNLOAD_AUDIO_SLICE: &str = "download_audio_slice";
pub const GET_TRANSCRIPT: &str = "get_transcript";
pub const GET_AVAILABLE_TRANSCRIPT_LANGUAGES: &str = "get_available_transcript_languages";

fn url_field() -> Field {
    Field::required("url", FieldType::String, "YouTube video URL or ID")
}

fn output_path_field(default_output_dir: &str) -> Field {
    Field::optional(
        "outputPath",
        FieldType::String,
        &format!("Output directory path (default: {})", default_output_dir),
    )
    .with_default(default_output_dir)
}

fn format_field() -> Field {
    Field::optional("format", FieldType::String, "Audio format (default: mp3)").with_default("mp3")
}

fn start_time_field() -> Field {
    Field::required("startTime", FieldType::Number, "Start time in seconds")
}

fn end_time_field() -> Field {
    Field::required("endTime", FieldType::Number, "End time in seconds")
}

/// Build all descriptors, in the order they are advertised.
pub fn descriptors(default_output_dir: &str) -> Vec<OperationDescriptor> {
    vec![
        OperationDescriptor::new(
            GET_VIDEO_INFO,
            "Get information about a YouTube video including title, duration, and available formats",
            Schema::new().field(url_field()),
        ),
        OperationDescriptor::new(
            DOWNLOAD_VIDEO,
            "Download a YouTube video in specified quality",
            Schema::new()
                .field(url_field())
                .field(
                    Field::optional(
                        "quality",
                        FieldType::String,
                        "Video quality: highest, lowest, or a label such as 720p (default: highest)",
                    )
                    .with_default("highest"),
                )
                .field(output_path_field(default_output_dir)),
        ),
        OperationDescriptor::new(
            DOWNLOAD_VIDEO_SLICE,
            "Download a specific time slice of a YouTube video",
            Schema::new()
                .field(url_field())
                .field(start_time_field())
                .field(end_time_field())
                .field(output_path_field(default_output_dir)),
        ),
        OperationDescriptor::new(
            DOWNLOAD_AUDIO,
            "Download audio from a YouTube video",
            Schema::new()
                .field(url_field())
                .field(format_field())
                .field(output_path_field(default_output_dir)),
        ),
        OperationDescriptor::new(
            DOWNLOAD_AUDIO_SLICE,
            "Download a specific time slice of audio from a YouTube video",
            Schema::new()
                .field(url_field())
                .field(start_time_field())
                .field(end_time_field())
                .field(format_field())
                .field(output_path_field(default_output_dir)),
        ),
        OperationDescriptor::new(
            GET_TRANSCRIPT,
            "Get transcript of a YouTube video in specified language",
            Schema::new().field(url_field()).field(
                Field::optional("language", FieldType::String, "Language code (default: en)")
                    .with_default("en"),
            ),
        ),
        OperationDescriptor::new(
            GET_AVAILABLE_TRANSCRIPT_LANGUAGES,
            "Get list of available transcript languages for a YouTube video",
            Schema::new().field(url_field()),
        ),
    ]
}
