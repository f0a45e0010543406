//! Typed models of the `content.xml` / `setup2.xml` pair shipped in every package.
//!
//! A package is described by a [`ContentManifest`] (the data files it registers
//! and the change set enabling them) and a [`SetupManifest`] (the device and
//! the change-set group). Both are built from an entity name by
//! [`ManifestKeys`] and rendered to text with [`ContentManifest::render`] and
//! [`SetupManifest::render`].

use std::fmt;

/// Platform token left for the game to expand at load time.
pub const PLATFORM_TOKEN: &str = "%PLATFORM%";

const SETUP_TYPE: &str = "EXTRACONTENT_COMPAT_PACK";
const STARTUP_GROUP: &str = "GROUP_STARTUP";
const VEHICLE_ORDER: u32 = 9;
const AUDIO_ORDER: u32 = 343;

/// Substitution keys derived from one entity name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestKeys {
    /// Lowercased entity name.
    pub name: String,
}

impl ManifestKeys {
    pub fn new(entity: &str) -> Self {
        Self {
            name: entity.to_lowercase(),
        }
    }

    pub fn vehicle_device_name(&self) -> String {
        format!("dlc_{}", self.name)
    }

    pub fn vehicle_name_hash(&self) -> String {
        self.name.clone()
    }

    pub fn vehicle_change_set(&self) -> String {
        format!("{}_AUTOGEN", self.name)
    }

    pub fn mods_rpf_name(&self) -> String {
        format!("{}_mods.rpf", self.name)
    }

    pub fn audio_device_name(&self) -> String {
        format!("dlc_{}_audio", self.name)
    }

    pub fn audio_name_hash(&self) -> String {
        format!("{}_audio", self.name)
    }

    pub fn audio_change_set(&self) -> String {
        format!("{}_audio_AUTOGEN", self.name)
    }

    /// Folder (and wave pack) name for the audio archives.
    pub fn sfx_pack_name(&self) -> String {
        format!("dlc_{}", self.name)
    }

    pub fn default_game_dat(&self) -> String {
        format!("{}_game.dat", self.name)
    }

    pub fn default_sounds_dat(&self) -> String {
        format!("{}_sounds.dat", self.name)
    }
}

/// Audio file names referenced by the audio content manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFileNames {
    pub game_dat: String,
    pub sounds_dat: String,
    pub sfx_pack: String,
}

/// One `<dataFiles>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFile {
    pub filename: String,
    pub file_type: &'static str,
    pub persistent: bool,
}

/// Model of `content.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentManifest {
    pub data_files: Vec<DataFile>,
    pub change_set_name: String,
    pub files_to_enable: Vec<String>,
}

/// Model of `setup2.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupManifest {
    pub device_name: String,
    pub name_hash: String,
    pub change_set_name: String,
    pub order: u32,
}

impl ContentManifest {
    /// Content manifest of the vehicle package.
    pub fn vehicle(keys: &ManifestKeys) -> Self {
        let device = keys.vehicle_device_name();
        let data = |file: &str, file_type| DataFile {
            filename: format!("{device}:/data/{file}"),
            file_type,
            persistent: false,
        };
        let rpf = |file: String| DataFile {
            filename: format!("{device}:/{PLATFORM_TOKEN}/{file}"),
            file_type: "RPF_FILE",
            persistent: true,
        };

        let data_files = vec![
            data("vehicles.meta", "VEHICLE_METADATA_FILE"),
            data("carcols.meta", "CARCOLS_FILE"),
            data("carvariations.meta", "VEHICLE_VARIATION_FILE"),
            data("dlctext.meta", "TEXTFILE_METAFILE"),
            data("handling.meta", "HANDLING_FILE"),
            rpf("vehicles.rpf".to_string()),
            rpf(format!("vehiclemods/{}", keys.mods_rpf_name())),
        ];

        // handling.meta is enabled first, the rest in declaration order
        let mut files_to_enable: Vec<String> =
            vec![format!("{device}:/data/handling.meta")];
        files_to_enable.extend(
            data_files
                .iter()
                .map(|f| f.filename.clone())
                .filter(|f| !f.ends_with("/handling.meta")),
        );

        Self {
            data_files,
            change_set_name: keys.vehicle_change_set(),
            files_to_enable,
        }
    }

    /// Content manifest of the audio package.
    pub fn audio(keys: &ManifestKeys, files: &AudioFileNames) -> Self {
        let device = keys.audio_device_name();
        let audio = |file: String, file_type| DataFile {
            filename: format!("{device}:/{PLATFORM_TOKEN}/audio/{file}"),
            file_type,
            persistent: false,
        };

        let data_files = vec![
            audio(files.game_dat.clone(), "AUDIO_GAMEDATA"),
            audio(files.sounds_dat.clone(), "AUDIO_SOUNDDATA"),
            audio(format!("sfx/{}", files.sfx_pack), "AUDIO_WAVEPACK"),
        ];
        let files_to_enable = data_files.iter().map(|f| f.filename.clone()).collect();

        Self {
            data_files,
            change_set_name: keys.audio_change_set(),
            files_to_enable,
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ContentManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        writeln!(f, "<CDataFileMgr__ContentsOfDataFileXml>")?;
        writeln!(f, "  <disabledFiles />")?;
        writeln!(f, "  <includedXmlFiles />")?;
        writeln!(f, "  <includedDataFiles />")?;
        writeln!(f, "  <dataFiles>")?;
        for file in &self.data_files {
            writeln!(f, "    <Item>")?;
            writeln!(f, "      <filename>{}</filename>", file.filename)?;
            writeln!(f, "      <fileType>{}</fileType>", file.file_type)?;
            writeln!(f, "      <overlay value=\"false\" />")?;
            writeln!(f, "      <disabled value=\"true\" />")?;
            writeln!(f, "      <persistent value=\"{}\" />", file.persistent)?;
            writeln!(f, "    </Item>")?;
        }
        writeln!(f, "  </dataFiles>")?;
        writeln!(f, "  <contentChangeSets>")?;
        writeln!(f, "    <Item>")?;
        writeln!(f, "      <changeSetName>{}</changeSetName>", self.change_set_name)?;
        writeln!(f, "      <filesToDisable />")?;
        writeln!(f, "      <filesToEnable>")?;
        for file in &self.files_to_enable {
            writeln!(f, "        <Item>{file}</Item>")?;
        }
        writeln!(f, "      </filesToEnable>")?;
        writeln!(f, "      <txdToLoad />")?;
        writeln!(f, "      <txdToUnload />")?;
        writeln!(f, "      <residentResources />")?;
        writeln!(f, "      <unregisterResources />")?;
        writeln!(f, "    </Item>")?;
        writeln!(f, "  </contentChangeSets>")?;
        writeln!(f, "  <patchFiles />")?;
        writeln!(f, "</CDataFileMgr__ContentsOfDataFileXml>")
    }
}

impl SetupManifest {
    pub fn vehicle(keys: &ManifestKeys) -> Self {
        Self {
            device_name: keys.vehicle_device_name(),
            name_hash: keys.vehicle_name_hash(),
            change_set_name: keys.vehicle_change_set(),
            order: VEHICLE_ORDER,
        }
    }

    pub fn audio(keys: &ManifestKeys) -> Self {
        Self {
            device_name: keys.audio_device_name(),
            name_hash: keys.audio_name_hash(),
            change_set_name: keys.audio_change_set(),
            order: AUDIO_ORDER,
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SetupManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        writeln!(f, "<SSetupData>")?;
        writeln!(f, "  <deviceName>{}</deviceName>", self.device_name)?;
        writeln!(f, "  <datFile>content.xml</datFile>")?;
        writeln!(f, "  <timeStamp>00/00/0000 00:00:00</timeStamp>")?;
        writeln!(f, "  <nameHash>{}</nameHash>", self.name_hash)?;
        writeln!(f, "  <contentChangeSetGroups>")?;
        writeln!(f, "    <Item>")?;
        writeln!(f, "      <NameHash>{STARTUP_GROUP}</NameHash>")?;
        writeln!(f, "      <ContentChangeSets>")?;
        writeln!(f, "        <Item>{}</Item>", self.change_set_name)?;
        writeln!(f, "      </ContentChangeSets>")?;
        writeln!(f, "    </Item>")?;
        writeln!(f, "  </contentChangeSetGroups>")?;
        writeln!(f, "  <type>{SETUP_TYPE}</type>")?;
        writeln!(f, "  <order value=\"{}\" />", self.order)?;
        writeln!(f, "</SSetupData>")
    }
}
