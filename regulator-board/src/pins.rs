use embassy_stm32::peripherals::*;

////////////////////////////
//  channel 1, buck-boost  //
////////////////////////////

pub type Ch1BuckTimer = TIM2; // master
pub type Ch1BuckPwmPin = PB10; // ch3
pub type Ch1BoostTimer = TIM4; // gated slave on ITR1
pub type Ch1BoostPwmPin = PB8; // ch3
pub type Ch1SenseEnablePin = PA5;

//////////////////////
//  channel 2, buck  //
//////////////////////

pub type Ch2Timer = TIM3;
pub type Ch2BatteryPwmPin = PA6; // ch1
pub type Ch2InputPwmPin = PB0; // ch3

///////////////////////
//  analog front end  //
///////////////////////

pub type SenseAdc = ADC1;
pub type Ch1VoltageSensePin = PA0;
pub type Ch1CurrentSensePin = PA1;
pub type Ch2VoltageSensePin = PC0;
pub type Ch2CurrentSensePin = PC1;
