/// Texture file loading, dispatched on the file extension
///
/// `.dds` goes through the DDS parser and keeps its stored format and mips.
/// `.png`, `.jpg`, `.jpeg`, `.tga` and `.bmp` are decoded with `image` into
/// a single-level R8G8B8A8 texture.

use std::path::Path;

use image::ImageFormat;

use crate::error::{Error, Result};
use crate::filesystem;
use crate::video::{dds, Format, TextureData, TextureDescription, TextureLoadFlags};

const SOURCE: &str = "gek::video::TextureLoader";

enum FileKind {
    Dds,
    Image(ImageFormat),
}

fn file_kind(path: &Path) -> Result<FileKind> {
    let extension = filesystem::extension(path);
    match extension.as_str() {
        "dds" => Ok(FileKind::Dds),
        "png" => Ok(FileKind::Image(ImageFormat::Png)),
        "jpg" | "jpeg" => Ok(FileKind::Image(ImageFormat::Jpeg)),
        "tga" => Ok(FileKind::Image(ImageFormat::Tga)),
        "bmp" => Ok(FileKind::Image(ImageFormat::Bmp)),
        _ => {
            let message = format!("{}: unsupported texture extension '{}'", path.display(), extension);
            crate::engine_error!(SOURCE, "{}", message);
            Err(Error::FileSystem(message))
        }
    }
}

fn image_error(path: &Path, error: image::ImageError) -> Error {
    let message = format!("{}: {}", path.display(), error);
    crate::engine_error!(SOURCE, "Unable to decode {}", message);
    Error::FileSystem(message)
}

fn color_format(flags: TextureLoadFlags) -> Format {
    if flags.contains(TextureLoadFlags::SRGB) {
        Format::R8G8B8A8_UNORM_SRGB
    } else {
        Format::R8G8B8A8_UNORM
    }
}

/// Decode a texture file into a description and its subresources
pub fn load_texture_file(path: &Path, flags: TextureLoadFlags) -> Result<(TextureDescription, TextureData)> {
    let name = path.display().to_string();
    let kind = file_kind(path)?;
    let bytes = filesystem::load(path)?;

    let (description, data) = match kind {
        FileKind::Dds => {
            let (mut description, data) =
                dds::parse(&bytes, &name, flags.contains(TextureLoadFlags::SKIP_MIP_MAPS))?;
            if flags.contains(TextureLoadFlags::SRGB) {
                description.format = description.format.to_srgb();
            }
            (description, data)
        }
        FileKind::Image(format) => {
            let image = image::load_from_memory_with_format(&bytes, format)
                .map_err(|error| image_error(path, error))?
                .to_rgba8();
            let (width, height) = image.dimensions();
            let description = TextureDescription::texture_2d(&name, color_format(flags), width, height);
            (description, TextureData::single(image.into_raw()))
        }
    };

    crate::engine_debug!(
        SOURCE,
        "Loaded '{}' ({}x{} {}, {} mips)",
        name, description.width, description.height, description.format, description.mip_levels()
    );
    Ok((description, data))
}

/// Read the description of a texture file without decoding pixel data
pub fn read_texture_description(path: &Path) -> Result<TextureDescription> {
    let name = path.display().to_string();
    match file_kind(path)? {
        FileKind::Dds => {
            let bytes = filesystem::load_prefix(path, dds::MAX_HEADER_LEN)?;
            Ok(dds::parse_header(&bytes, &name)?.description)
        }
        FileKind::Image(_) => {
            let (width, height) = image::image_dimensions(path).map_err(|error| image_error(path, error))?;
            Ok(TextureDescription::texture_2d(&name, Format::R8G8B8A8_UNORM, width, height))
        }
    }
}

#[cfg(test)]
#[path = "texture_loader_tests.rs"]
mod tests;
