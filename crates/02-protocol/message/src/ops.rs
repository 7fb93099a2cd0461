//! Message facility type codes and subtypes understood by the runtime.

/// Facility type codes (header byte 0).
pub mod facility {
    pub const MESSAGE_HANDLER: u8 = 1;
    pub const SLOW_CONTROL: u8 = 2;
    pub const DATA_ACCESS: u8 = 3;
    pub const EXPERIMENT_CONTROL: u8 = 4;
}

/// MESSAGE_HANDLER subtypes.
pub mod msghand {
    pub const GET_DOM_ID: u8 = 10;
    pub const ECHO_MSG: u8 = 18;
    pub const GET_DOMAPP_RELEASE: u8 = 24;
}

/// SLOW_CONTROL subtypes.
pub mod slow {
    pub const WRITE_ONE_DAC: u8 = 13;
    pub const SET_PMT_HV: u8 = 14;
    pub const ENABLE_PMT_HV: u8 = 16;
    pub const DISABLE_PMT_HV: u8 = 18;
    pub const QUERY_PMT_HV: u8 = 22;
    pub const SET_TRIG_MODE: u8 = 31;
    pub const SELECT_ATWD: u8 = 33;
    pub const MUX_SELECT: u8 = 35;
    pub const SET_PULSER_RATE: u8 = 37;
    pub const SET_PULSER_ON: u8 = 39;
    pub const SET_PULSER_OFF: u8 = 40;
    pub const SET_SCALER_DEADTIME: u8 = 43;
    pub const SET_LOCAL_COIN_MODE: u8 = 45;
    pub const SET_LOCAL_COIN_WINDOW: u8 = 47;
    pub const SET_LC_TYPE: u8 = 49;
    pub const SET_LC_TX: u8 = 51;
    pub const SET_LC_SRC: u8 = 53;
    pub const SET_LC_SPAN: u8 = 55;
    pub const SET_LC_CABLE_LEN: u8 = 57;
    pub const ENABLE_SN: u8 = 59;
    pub const DISABLE_SN: u8 = 60;
}

/// DATA_ACCESS subtypes.
pub mod data {
    pub const GET_DATA: u8 = 11;
    pub const GET_NEXT_MONI_REC: u8 = 12;
    pub const SET_MONI_IVAL: u8 = 13;
    pub const SET_ENG_FMT: u8 = 14;
    pub const RESET_LOOKBACK_MEMORY: u8 = 22;
    pub const GET_FB_SERIAL: u8 = 23;
    pub const SET_DATA_FORMAT: u8 = 24;
    pub const SET_COMP_MODE: u8 = 26;
    pub const GET_SN_DATA: u8 = 28;
    pub const RESET_MONI_BUF: u8 = 29;
}

/// EXPERIMENT_CONTROL subtypes.
pub mod expctl {
    pub const BEGIN_RUN: u8 = 12;
    pub const END_RUN: u8 = 13;
}

/// DAC channel numbers.
pub mod dac {
    pub const ATWD0_TRIGGER_BIAS: u8 = 0;
    pub const ATWD0_RAMP_TOP: u8 = 1;
    pub const ATWD0_RAMP_RATE: u8 = 2;
    pub const ATWD_ANALOG_REF: u8 = 3;
    pub const ATWD1_TRIGGER_BIAS: u8 = 4;
    pub const ATWD1_RAMP_TOP: u8 = 5;
    pub const ATWD1_RAMP_RATE: u8 = 6;
    pub const PMT_FE_PEDESTAL: u8 = 7;
    pub const MULTIPLE_SPE_THRESH: u8 = 8;
    pub const SINGLE_SPE_THRESH: u8 = 9;
    pub const FADC_REF: u8 = 10;
    pub const INTERNAL_PULSER_AMP: u8 = 11;
}
