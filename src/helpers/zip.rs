//! Zip archive access for the package-based formats (xlsx, xlsm, ods).

use crate::error::ReadError;
use crate::helpers::xml::XmlReader;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

pub(crate) trait ZipHelper<RS: Read + Seek> {
    /// Looks up an entry by name, ignoring ASCII case and normalizing `\` separators.
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, ReadError>;

    /// Opens an entry as an XML event stream.
    fn xml_reader(&'_ mut self, name: &str) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, ReadError>;
}

impl<RS: Read + Seek> ZipHelper<RS> for ZipArchive<RS> {
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, ReadError> {
        let wanted = name.replace('\\', "/");
        let found = self
            .file_names()
            .find(|entry| entry.replace('\\', "/").eq_ignore_ascii_case(&wanted))
            .map(str::to_owned);
        let Some(entry) = found else {
            return Ok(None);
        };
        match self.by_name(&entry) {
            Ok(file) => Ok(Some(file)),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn xml_reader(&'_ mut self, name: &str) -> Result<Option<XmlReader<BufReader<ZipFile<'_, RS>>>>, ReadError> {
        Ok(self.file(name)?.map(|file| XmlReader::new(BufReader::new(file))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn archive() -> ZipArchive<Cursor<Vec<u8>>> {
        let mut buffer = Cursor::new(Vec::new());
        let mut writer = ZipWriter::new(&mut buffer);
        writer.start_file("xl/Workbook.xml", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"<workbook/>").unwrap();
        writer.finish().unwrap();
        ZipArchive::new(Cursor::new(buffer.into_inner())).unwrap()
    }

    #[test]
    fn file_lookup_ignores_case_and_separator() {
        let mut zip = archive();
        assert!(zip.file("xl/workbook.xml").unwrap().is_some());
        assert!(zip.file("XL\\WORKBOOK.XML").unwrap().is_some());
        assert!(zip.file("xl/styles.xml").unwrap().is_none());
    }
}
