//! Synthetic PowerCenter export used by the demo run

use std::fs;
use std::path::Path;

use eyre::{Context, Result};
use tracing::{debug, info};

/// Default file name the demo writes the sample to
pub const SAMPLE_FILE_NAME: &str = "sample_powercenter.xml";

/// Sales data warehouse export: two Oracle sources, three transformations,
/// one target and a mapping connecting them
const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<POWERMART CREATION_DATE="12/15/2023 10:30:00" REPOSITORY_VERSION="9.6.1">
    <REPOSITORY NAME="SALES_DW_REPO" VERSION="1.0" CODEPAGE="UTF-8">
        <FOLDER NAME="SALES_ETL" GROUP="" OWNER="admin" SHARED="NOTSHARED">

            <!-- Source Definitions -->
            <SOURCE BUSINESSNAME="" DATABASETYPE="Oracle" NAME="SRC_CUSTOMERS"
                    OWNERNAME="SALES_DB" VERSIONNUMBER="1">
                <SOURCEFIELD BUSINESSNAME="" DATATYPE="string" DESCRIPTION=""
                           FIELDNUMBER="1" KEYTYPE="NOT A KEY" LENGTH="50"
                           NAME="CUSTOMER_ID" NULLABLE="NOTNULL" PRECISION="0" SCALE="0"/>
                <SOURCEFIELD BUSINESSNAME="" DATATYPE="string" DESCRIPTION=""
                           FIELDNUMBER="2" KEYTYPE="NOT A KEY" LENGTH="100"
                           NAME="CUSTOMER_NAME" NULLABLE="NULL" PRECISION="0" SCALE="0"/>
                <SOURCEFIELD BUSINESSNAME="" DATATYPE="string" DESCRIPTION=""
                           FIELDNUMBER="3" KEYTYPE="NOT A KEY" LENGTH="10"
                           NAME="CUSTOMER_STATUS" NULLABLE="NULL" PRECISION="0" SCALE="0"/>
            </SOURCE>

            <SOURCE BUSINESSNAME="" DATABASETYPE="Oracle" NAME="SRC_ORDERS"
                    OWNERNAME="SALES_DB" VERSIONNUMBER="1">
                <SOURCEFIELD NAME="ORDER_ID" DATATYPE="decimal" LENGTH="10" PRECISION="0" SCALE="0"/>
                <SOURCEFIELD NAME="CUSTOMER_ID" DATATYPE="string" LENGTH="50" PRECISION="0" SCALE="0"/>
                <SOURCEFIELD NAME="ORDER_DATE" DATATYPE="date/time" LENGTH="19" PRECISION="0" SCALE="0"/>
                <SOURCEFIELD NAME="ORDER_AMOUNT" DATATYPE="decimal" LENGTH="15" PRECISION="2" SCALE="2"/>
            </SOURCE>

            <!-- Transformations -->
            <TRANSFORMATION DESCRIPTION="Filter active customers" NAME="FLT_ACTIVE_CUSTOMERS"
                           OBJECTVERSION="1" TYPE="Filter" VERSIONNUMBER="1">
                <TRANSFORMFIELD DATATYPE="string" NAME="CUSTOMER_ID" PORTTYPE="INPUT" LENGTH="50"/>
                <TRANSFORMFIELD DATATYPE="string" NAME="CUSTOMER_NAME" PORTTYPE="INPUT" LENGTH="100"/>
                <TRANSFORMFIELD DATATYPE="string" NAME="CUSTOMER_STATUS" PORTTYPE="INPUT" LENGTH="10"/>
                <TRANSFORMFIELD DATATYPE="string" NAME="CUSTOMER_ID" PORTTYPE="OUTPUT" LENGTH="50"/>
                <TRANSFORMFIELD DATATYPE="string" NAME="CUSTOMER_NAME" PORTTYPE="OUTPUT" LENGTH="100"/>
            </TRANSFORMATION>

            <TRANSFORMATION DESCRIPTION="Lookup customer details" NAME="LKP_CUSTOMER_DETAILS"
                           OBJECTVERSION="1" TYPE="Lookup" VERSIONNUMBER="1">
                <TRANSFORMFIELD NAME="CUSTOMER_ID" PORTTYPE="INPUT" DATATYPE="string" LENGTH="50"/>
                <TRANSFORMFIELD NAME="CUSTOMER_NAME" PORTTYPE="OUTPUT" DATATYPE="string" LENGTH="100"/>
                <TRANSFORMFIELD NAME="CUSTOMER_TIER" PORTTYPE="OUTPUT" DATATYPE="string" LENGTH="20"/>
            </TRANSFORMATION>

            <TRANSFORMATION DESCRIPTION="Calculate order metrics" NAME="AGG_ORDER_SUMMARY"
                           OBJECTVERSION="1" TYPE="Aggregator" VERSIONNUMBER="1">
                <TRANSFORMFIELD NAME="CUSTOMER_ID" PORTTYPE="INPUT" DATATYPE="string" LENGTH="50"/>
                <TRANSFORMFIELD NAME="ORDER_AMOUNT" PORTTYPE="INPUT" DATATYPE="decimal" LENGTH="15" PRECISION="2"/>
                <TRANSFORMFIELD NAME="CUSTOMER_ID" PORTTYPE="OUTPUT" DATATYPE="string" LENGTH="50"/>
                <TRANSFORMFIELD NAME="TOTAL_ORDERS" PORTTYPE="OUTPUT" DATATYPE="decimal" LENGTH="10"/>
                <TRANSFORMFIELD NAME="AVG_ORDER_VALUE" PORTTYPE="OUTPUT" DATATYPE="decimal" LENGTH="15" PRECISION="2"/>
            </TRANSFORMATION>

            <!-- Target Definition -->
            <TARGET BUSINESSNAME="" DATABASETYPE="Oracle" NAME="TGT_CUSTOMER_SUMMARY"
                   OWNERNAME="DW_SCHEMA" VERSIONNUMBER="1">
                <TARGETFIELD DATATYPE="string" KEYTYPE="PRIMARY KEY" LENGTH="50"
                           NAME="CUSTOMER_ID" NULLABLE="NOTNULL" PRECISION="0" SCALE="0"/>
                <TARGETFIELD DATATYPE="string" KEYTYPE="NOT A KEY" LENGTH="100"
                           NAME="CUSTOMER_NAME" NULLABLE="NULL" PRECISION="0" SCALE="0"/>
                <TARGETFIELD DATATYPE="string" KEYTYPE="NOT A KEY" LENGTH="20"
                           NAME="CUSTOMER_TIER" NULLABLE="NULL" PRECISION="0" SCALE="0"/>
                <TARGETFIELD DATATYPE="decimal" KEYTYPE="NOT A KEY" LENGTH="10"
                           NAME="TOTAL_ORDERS" NULLABLE="NULL" PRECISION="0" SCALE="0"/>
                <TARGETFIELD DATATYPE="decimal" KEYTYPE="NOT A KEY" LENGTH="15"
                           NAME="AVG_ORDER_VALUE" NULLABLE="NULL" PRECISION="2" SCALE="2"/>
            </TARGET>

            <!-- Mapping Definition -->
            <MAPPING DESCRIPTION="Customer summary ETL mapping" NAME="m_CUSTOMER_SUMMARY"
                    OBJECTVERSION="1" VERSIONNUMBER="1" ISVALID="YES">
                <SHORTCUT FOLDERNAME="SALES_ETL" NAME="SRC_CUSTOMERS" OBJECTSUBTYPE="Source Definition"
                          OBJECTTYPE="Source" REFERENCEDOBJECTNAME="SRC_CUSTOMERS" VERSIONNUMBER="1"/>
                <SHORTCUT FOLDERNAME="SALES_ETL" NAME="SRC_ORDERS" OBJECTSUBTYPE="Source Definition"
                          OBJECTTYPE="Source" REFERENCEDOBJECTNAME="SRC_ORDERS" VERSIONNUMBER="1"/>
                <SHORTCUT FOLDERNAME="SALES_ETL" NAME="TGT_CUSTOMER_SUMMARY" OBJECTSUBTYPE="Target Definition"
                          OBJECTTYPE="Target" REFERENCEDOBJECTNAME="TGT_CUSTOMER_SUMMARY" VERSIONNUMBER="1"/>
                <CONNECTOR FROMFIELD="CUSTOMER_ID" FROMINSTANCE="SRC_CUSTOMERS" FROMINSTANCETYPE="Source Definition"
                           TOFIELD="CUSTOMER_ID" TOINSTANCE="FLT_ACTIVE_CUSTOMERS" TOINSTANCETYPE="Filter"/>
                <CONNECTOR FROMFIELD="CUSTOMER_NAME" FROMINSTANCE="SRC_CUSTOMERS" FROMINSTANCETYPE="Source Definition"
                           TOFIELD="CUSTOMER_NAME" TOINSTANCE="FLT_ACTIVE_CUSTOMERS" TOINSTANCETYPE="Filter"/>
                <CONNECTOR FROMFIELD="CUSTOMER_STATUS" FROMINSTANCE="SRC_CUSTOMERS" FROMINSTANCETYPE="Source Definition"
                           TOFIELD="CUSTOMER_STATUS" TOINSTANCE="FLT_ACTIVE_CUSTOMERS" TOINSTANCETYPE="Filter"/>
                <CONNECTOR FROMFIELD="CUSTOMER_ID" FROMINSTANCE="FLT_ACTIVE_CUSTOMERS" FROMINSTANCETYPE="Filter"
                           TOFIELD="CUSTOMER_ID" TOINSTANCE="LKP_CUSTOMER_DETAILS" TOINSTANCETYPE="Lookup"/>
                <CONNECTOR FROMFIELD="CUSTOMER_ID" FROMINSTANCE="SRC_ORDERS" FROMINSTANCETYPE="Source Definition"
                           TOFIELD="CUSTOMER_ID" TOINSTANCE="AGG_ORDER_SUMMARY" TOINSTANCETYPE="Aggregator"/>
                <CONNECTOR FROMFIELD="ORDER_AMOUNT" FROMINSTANCE="SRC_ORDERS" FROMINSTANCETYPE="Source Definition"
                           TOFIELD="ORDER_AMOUNT" TOINSTANCE="AGG_ORDER_SUMMARY" TOINSTANCETYPE="Aggregator"/>
                <CONNECTOR FROMFIELD="CUSTOMER_NAME" FROMINSTANCE="LKP_CUSTOMER_DETAILS" FROMINSTANCETYPE="Lookup"
                           TOFIELD="CUSTOMER_NAME" TOINSTANCE="TGT_CUSTOMER_SUMMARY" TOINSTANCETYPE="Target Definition"/>
                <CONNECTOR FROMFIELD="CUSTOMER_TIER" FROMINSTANCE="LKP_CUSTOMER_DETAILS" FROMINSTANCETYPE="Lookup"
                           TOFIELD="CUSTOMER_TIER" TOINSTANCE="TGT_CUSTOMER_SUMMARY" TOINSTANCETYPE="Target Definition"/>
                <CONNECTOR FROMFIELD="CUSTOMER_ID" FROMINSTANCE="FLT_ACTIVE_CUSTOMERS" FROMINSTANCETYPE="Filter"
                           TOFIELD="CUSTOMER_ID" TOINSTANCE="TGT_CUSTOMER_SUMMARY" TOINSTANCETYPE="Target Definition"/>
                <CONNECTOR FROMFIELD="TOTAL_ORDERS" FROMINSTANCE="AGG_ORDER_SUMMARY" FROMINSTANCETYPE="Aggregator"
                           TOFIELD="TOTAL_ORDERS" TOINSTANCE="TGT_CUSTOMER_SUMMARY" TOINSTANCETYPE="Target Definition"/>
                <CONNECTOR FROMFIELD="AVG_ORDER_VALUE" FROMINSTANCE="AGG_ORDER_SUMMARY" FROMINSTANCETYPE="Aggregator"
                           TOFIELD="AVG_ORDER_VALUE" TOINSTANCE="TGT_CUSTOMER_SUMMARY" TOINSTANCETYPE="Target Definition"/>
            </MAPPING>

        </FOLDER>
    </REPOSITORY>
</POWERMART>
"#;

/// Build the synthetic PowerCenter export
pub fn generate_sample_xml() -> String {
    debug!("generate_sample_xml: called");
    SAMPLE_XML.to_string()
}

/// Write the synthetic export to `path`
pub fn write_sample(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    debug!(?path, "write_sample: called");
    fs::write(path, generate_sample_xml()).context(format!("Failed to write sample XML to {}", path.display()))?;
    info!("Wrote sample PowerCenter XML to {}", path.display());
    Ok(())
}
