//! Built-in NSIS installer template.
//!
//! Custom templates (configured per product) must carry every placeholder in
//! [`REQUIRED_PLACEHOLDERS`].

/// Placeholders every installer template has to reference.
pub const REQUIRED_PLACEHOLDERS: &[&str] = &[
    "version_defines",
    "source_root",
    "install_files",
    "delete_files",
];

/// Default Modern UI installer script.
pub const NSI_TEMPLATE: &str = r#"Unicode true
SetCompressor /SOLID {{compression}}
RequestExecutionLevel admin

{{{version_defines}}}

!define SOURCE_ROOT "{{source_root}}"
!define PUBLISHER "{{publisher}}"

{{{inst_vars}}}

!define MULTIUSER_EXECUTIONLEVEL Highest
!define MULTIUSER_INSTALLMODE_INSTDIR "${INSTNAME}"
!define MULTIUSER_MUI
{{#if per_machine}}
!define MULTIUSER_INSTALLMODE_DEFAULT_ALLUSERS
{{/if}}
{{{program_files}}}
!include MultiUser.nsh
!include MUI2.nsh

VIProductVersion "{{version_nsis}}"
VIAddVersionKey "ProductName" "${SHORTCUT}"
VIAddVersionKey "CompanyName" "${PUBLISHER}"
VIAddVersionKey "FileVersion" "${VERSION_LONG}"
VIAddVersionKey "ProductVersion" "${VERSION_LONG}"

!insertmacro MUI_PAGE_DIRECTORY
!insertmacro MUI_PAGE_INSTFILES
!insertmacro MUI_UNPAGE_CONFIRM
!insertmacro MUI_UNPAGE_INSTFILES
!insertmacro MUI_LANGUAGE "English"

Function .onInit
    !insertmacro MULTIUSER_INIT
FunctionEnd

Function un.onInit
    !insertmacro MULTIUSER_UNINIT
FunctionEnd

Section "Install"
    {{{engage_registry}}}

{{{install_files}}}

    SetOutPath "$INSTDIR"
    WriteUninstaller "$INSTDIR\uninst.exe"
    CreateDirectory "$SMPROGRAMS\${SHORTCUT}"
    CreateShortCut "$SMPROGRAMS\${SHORTCUT}\${SHORTCUT}.lnk" "$INSTDIR\${VIEWER_EXE}"
    WriteRegStr SHCTX "Software\${PUBLISHER}\${INSTNAME}" "" "$INSTDIR"
    WriteRegStr SHCTX "Software\${PUBLISHER}\${INSTNAME}" "Version" "${VERSION_REGISTRY}"
    WriteRegStr SHCTX "Software\Microsoft\Windows\CurrentVersion\Uninstall\${INSTNAME}" "DisplayName" "${SHORTCUT}"
    WriteRegStr SHCTX "Software\Microsoft\Windows\CurrentVersion\Uninstall\${INSTNAME}" "DisplayVersion" "${VERSION_LONG}"
    WriteRegStr SHCTX "Software\Microsoft\Windows\CurrentVersion\Uninstall\${INSTNAME}" "Publisher" "${PUBLISHER}"
    WriteRegStr SHCTX "Software\Microsoft\Windows\CurrentVersion\Uninstall\${INSTNAME}" "UninstallString" "$\"$INSTDIR\uninst.exe$\""
SectionEnd

Section "Uninstall"
    {{{engage_registry}}}

{{{delete_files}}}

    Delete "$INSTDIR\uninst.exe"
    RMDir "$INSTDIR"
    Delete "$SMPROGRAMS\${SHORTCUT}\${SHORTCUT}.lnk"
    RMDir "$SMPROGRAMS\${SHORTCUT}"
    DeleteRegKey SHCTX "Software\${PUBLISHER}\${INSTNAME}"
    DeleteRegKey SHCTX "Software\Microsoft\Windows\CurrentVersion\Uninstall\${INSTNAME}"
SectionEnd
"#;
